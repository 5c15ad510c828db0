use crate::domain::audit::AuditLogEntry;
use crate::domain::deduction::Deduction;
use crate::domain::order::Order;
use crate::domain::payment::Payment;
use crate::domain::payout::{Payout, PayoutRequest};
use crate::domain::settlement::{Settlement, SettlementStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Read-only view over the order collaborator.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>>;
    async fn completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait SettlementStore: Send + Sync {
    async fn insert(&self, settlement: Settlement) -> Result<()>;
    async fn update(&self, settlement: Settlement) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Settlement>>;
    async fn find_by_order(&self, order_id: Uuid) -> Result<Option<Settlement>>;
    async fn by_helper(&self, helper_id: Uuid) -> Result<Vec<Settlement>>;
    async fn by_status(&self, status: SettlementStatus) -> Result<Vec<Settlement>>;
    async fn all(&self) -> Result<Vec<Settlement>>;
}

#[async_trait]
pub trait DeductionStore: Send + Sync {
    async fn insert(&self, deduction: Deduction) -> Result<()>;
    async fn update(&self, deduction: Deduction) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Deduction>>;
    /// Applied deductions recorded against an order.
    async fn applied_for_order(&self, order_id: Uuid) -> Result<Vec<Deduction>>;
}

#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn insert(&self, payout: Payout) -> Result<()>;
    async fn update(&self, payout: Payout) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Payout>>;
    async fn by_settlement(&self, settlement_id: Uuid) -> Result<Vec<Payout>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> Result<()>;
    async fn update(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Payment>>;
    /// Pending payments that carry a due date, the escalation working set.
    async fn pending_with_due_date(&self) -> Result<Vec<Payment>>;
}

#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: AuditLogEntry) -> Result<()>;
    /// Entries for one entity, newest first.
    async fn list_for_entity(&self, entity_id: Uuid) -> Result<Vec<AuditLogEntry>>;
}

/// Fire-and-forget notification capability; delivery failures are not
/// currently observed.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, payment_id: Uuid, message: &str);
}

/// Opaque payout gateway; actual money movement happens elsewhere and is
/// reported back through `PayoutService::update_status`.
#[async_trait]
pub trait PayoutGateway: Send + Sync {
    async fn submit(&self, request: PayoutRequest) -> Result<()>;
}

pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type SettlementStoreRef = Arc<dyn SettlementStore>;
pub type DeductionStoreRef = Arc<dyn DeductionStore>;
pub type PayoutStoreRef = Arc<dyn PayoutStore>;
pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type AuditLogStoreRef = Arc<dyn AuditLogStore>;
pub type NotificationSinkRef = Arc<dyn NotificationSink>;
pub type PayoutGatewayRef = Arc<dyn PayoutGateway>;
