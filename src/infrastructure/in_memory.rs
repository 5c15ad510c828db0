use crate::domain::audit::AuditLogEntry;
use crate::domain::deduction::{Deduction, DeductionStatus};
use crate::domain::order::Order;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::payout::{Payout, PayoutRequest};
use crate::domain::ports::{
    AuditLogStore, DeductionStore, NotificationSink, OrderStore, PaymentStore, PayoutGateway,
    PayoutStore, SettlementStore,
};
use crate::domain::settlement::{Settlement, SettlementStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory view over the order collaborator.
///
/// Uses `Arc<RwLock<HashMap>>` to allow shared concurrent access. Ideal for
/// testing and for the CLI runner, where orders are imported from CSV.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| {
                o.is_completed()
                    && o.completed_at
                        .map(|at| at >= from && at < to)
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for settlements.
#[derive(Default, Clone)]
pub struct InMemorySettlementStore {
    settlements: Arc<RwLock<HashMap<Uuid, Settlement>>>,
}

impl InMemorySettlementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettlementStore for InMemorySettlementStore {
    async fn insert(&self, settlement: Settlement) -> Result<()> {
        self.settlements
            .write()
            .await
            .insert(settlement.id, settlement);
        Ok(())
    }

    async fn update(&self, settlement: Settlement) -> Result<()> {
        self.settlements
            .write()
            .await
            .insert(settlement.id, settlement);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Settlement>> {
        Ok(self.settlements.read().await.get(&id).cloned())
    }

    async fn find_by_order(&self, order_id: Uuid) -> Result<Option<Settlement>> {
        let settlements = self.settlements.read().await;
        Ok(settlements
            .values()
            .find(|s| s.order_id == order_id)
            .cloned())
    }

    async fn by_helper(&self, helper_id: Uuid) -> Result<Vec<Settlement>> {
        let settlements = self.settlements.read().await;
        Ok(settlements
            .values()
            .filter(|s| s.helper_id == helper_id)
            .cloned()
            .collect())
    }

    async fn by_status(&self, status: SettlementStatus) -> Result<Vec<Settlement>> {
        let settlements = self.settlements.read().await;
        Ok(settlements
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<Settlement>> {
        Ok(self.settlements.read().await.values().cloned().collect())
    }
}

/// A thread-safe in-memory store for deductions.
#[derive(Default, Clone)]
pub struct InMemoryDeductionStore {
    deductions: Arc<RwLock<HashMap<Uuid, Deduction>>>,
}

impl InMemoryDeductionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeductionStore for InMemoryDeductionStore {
    async fn insert(&self, deduction: Deduction) -> Result<()> {
        self.deductions
            .write()
            .await
            .insert(deduction.id, deduction);
        Ok(())
    }

    async fn update(&self, deduction: Deduction) -> Result<()> {
        self.deductions
            .write()
            .await
            .insert(deduction.id, deduction);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Deduction>> {
        Ok(self.deductions.read().await.get(&id).cloned())
    }

    async fn applied_for_order(&self, order_id: Uuid) -> Result<Vec<Deduction>> {
        let deductions = self.deductions.read().await;
        Ok(deductions
            .values()
            .filter(|d| d.order_id == Some(order_id) && d.status == DeductionStatus::Applied)
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for payouts.
#[derive(Default, Clone)]
pub struct InMemoryPayoutStore {
    payouts: Arc<RwLock<HashMap<Uuid, Payout>>>,
}

impl InMemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn insert(&self, payout: Payout) -> Result<()> {
        self.payouts.write().await.insert(payout.id, payout);
        Ok(())
    }

    async fn update(&self, payout: Payout) -> Result<()> {
        self.payouts.write().await.insert(payout.id, payout);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payout>> {
        Ok(self.payouts.read().await.get(&id).cloned())
    }

    async fn by_settlement(&self, settlement_id: Uuid) -> Result<Vec<Payout>> {
        let payouts = self.payouts.read().await;
        Ok(payouts
            .values()
            .filter(|p| p.settlement_id == settlement_id)
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for requester payments.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        self.payments.write().await.insert(payment.id, payment);
        Ok(())
    }

    async fn update(&self, payment: Payment) -> Result<()> {
        self.payments.write().await.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn pending_with_due_date(&self) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .filter(|p| p.status == PaymentStatus::Pending && p.due_date.is_some())
            .cloned()
            .collect())
    }
}

/// Append-only in-memory audit log.
#[derive(Default, Clone)]
pub struct InMemoryAuditLogStore {
    entries: Arc<RwLock<Vec<AuditLogEntry>>>,
}

impl InMemoryAuditLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list_for_entity(&self, entity_id: Uuid) -> Result<Vec<AuditLogEntry>> {
        let entries = self.entries.read().await;
        let mut matches: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect();
        matches.reverse();
        Ok(matches)
    }
}

/// Notification sink that records every message; lets tests assert on
/// exactly how many reminders went out.
#[derive(Default, Clone)]
pub struct RecordingNotificationSink {
    sent: Arc<RwLock<Vec<(Uuid, String)>>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(Uuid, String)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn send(&self, payment_id: Uuid, message: &str) {
        self.sent
            .write()
            .await
            .push((payment_id, message.to_string()));
    }
}

/// Payout gateway stub that records submitted requests.
#[derive(Default, Clone)]
pub struct RecordingPayoutGateway {
    requests: Arc<RwLock<Vec<PayoutRequest>>>,
}

impl RecordingPayoutGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn requests(&self) -> Vec<PayoutRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl PayoutGateway for RecordingPayoutGateway {
    async fn submit(&self, request: PayoutRequest) -> Result<()> {
        self.requests.write().await.push(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_settlement_store_roundtrip() {
        let store = InMemorySettlementStore::new();
        let settlement = Settlement::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::new(dec!(100.0)),
            Money::ZERO,
            Utc::now(),
        );

        store.insert(settlement.clone()).await.unwrap();
        let retrieved = store.get(settlement.id).await.unwrap().unwrap();
        assert_eq!(retrieved, settlement);

        let by_order = store.find_by_order(settlement.order_id).await.unwrap();
        assert_eq!(by_order.unwrap().id, settlement.id);

        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_audit_log_is_newest_first() {
        let store = InMemoryAuditLogStore::new();
        let entity_id = Uuid::new_v4();
        for action in ["created", "confirmed", "paid"] {
            store
                .append(AuditLogEntry {
                    id: Uuid::new_v4(),
                    entity_type: "settlement".to_string(),
                    entity_id,
                    action: action.to_string(),
                    actor_id: "admin-1".to_string(),
                    old_value: None,
                    new_value: serde_json::Value::Null,
                    notes: None,
                    recorded_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let entries = store.list_for_entity(entity_id).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action, "paid");
        assert_eq!(entries[2].action, "created");
    }

    #[tokio::test]
    async fn test_pending_with_due_date_filter() {
        let store = InMemoryPaymentStore::new();
        let now = Utc::now();

        let with_due = Payment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::new(dec!(1000)),
            Some(now),
            now,
        );
        let without_due =
            Payment::new(Uuid::new_v4(), Uuid::new_v4(), Money::new(dec!(1000)), None, now);
        let mut completed = Payment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::new(dec!(1000)),
            Some(now),
            now,
        );
        completed.status = PaymentStatus::Completed;

        store.insert(with_due.clone()).await.unwrap();
        store.insert(without_due).await.unwrap();
        store.insert(completed).await.unwrap();

        let pending = store.pending_with_due_date().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, with_due.id);
    }
}
