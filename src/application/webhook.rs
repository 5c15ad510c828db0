use crate::application::audit::AuditRecorder;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::PaymentStoreRef;
use crate::error::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

/// Inbound payment event from an external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub provider: String,
    pub event_type: String,
    pub payment_id: Uuid,
    pub status: String,
    pub amount: Option<Decimal>,
    pub metadata: Option<Value>,
}

/// Reconciles provider payment events against stored payments.
///
/// Correlation is by payment id; an unmatched id is logged and dropped, not
/// queued for retry.
pub struct WebhookProcessor {
    payments: PaymentStoreRef,
    audit: AuditRecorder,
}

impl WebhookProcessor {
    pub fn new(payments: PaymentStoreRef, audit: AuditRecorder) -> Self {
        Self { payments, audit }
    }

    /// Returns the reconciled payment, or `None` when the event did not
    /// match anything actionable.
    pub async fn reconcile(&self, event: WebhookEvent) -> Result<Option<Payment>> {
        let Some(payment) = self.payments.get(event.payment_id).await? else {
            warn!(
                provider = %event.provider,
                payment_id = %event.payment_id,
                "webhook for unknown payment dropped"
            );
            return Ok(None);
        };

        let mut updated = payment.clone();
        match event.status.as_str() {
            "paid" | "completed" => {
                updated.status = PaymentStatus::Completed;
                updated.paid_at = Some(Utc::now());
            }
            "failed" => {
                updated.status = PaymentStatus::Failed;
                updated.failure_reason = event
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("reason"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            other => {
                warn!(
                    provider = %event.provider,
                    payment_id = %event.payment_id,
                    status = other,
                    "webhook with unknown status dropped"
                );
                return Ok(None);
            }
        }

        self.payments.update(updated.clone()).await?;
        self.audit
            .record(
                "payment",
                updated.id,
                &format!("webhook_{}", event.event_type),
                &format!("provider:{}", event.provider),
                Some(&payment),
                &updated,
                None,
            )
            .await?;
        info!(payment_id = %updated.id, status = %updated.status, "payment reconciled from webhook");
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::ports::PaymentStore;
    use crate::infrastructure::in_memory::{InMemoryAuditLogStore, InMemoryPaymentStore};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn processor() -> (WebhookProcessor, InMemoryPaymentStore) {
        let payments = InMemoryPaymentStore::new();
        let audit = AuditRecorder::new(Arc::new(InMemoryAuditLogStore::new()));
        (
            WebhookProcessor::new(Arc::new(payments.clone()), audit),
            payments,
        )
    }

    async fn pending_payment(store: &InMemoryPaymentStore) -> Payment {
        let now = Utc::now();
        let payment = Payment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::new(dec!(50000)),
            Some(now),
            now,
        );
        store.insert(payment.clone()).await.unwrap();
        payment
    }

    fn event(payment_id: Uuid, status: &str, metadata: Option<Value>) -> WebhookEvent {
        WebhookEvent {
            provider: "bankpay".to_string(),
            event_type: "payment.updated".to_string(),
            payment_id,
            status: status.to_string(),
            amount: Some(dec!(50000)),
            metadata,
        }
    }

    #[tokio::test]
    async fn test_paid_event_completes_payment() {
        let (processor, payments) = processor();
        let payment = pending_payment(&payments).await;

        let reconciled = processor
            .reconcile(event(payment.id, "paid", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reconciled.status, PaymentStatus::Completed);
        assert!(reconciled.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_event_records_reason() {
        let (processor, payments) = processor();
        let payment = pending_payment(&payments).await;

        let reconciled = processor
            .reconcile(event(
                payment.id,
                "failed",
                Some(serde_json::json!({ "reason": "card declined" })),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reconciled.status, PaymentStatus::Failed);
        assert_eq!(reconciled.failure_reason.as_deref(), Some("card declined"));
    }

    #[tokio::test]
    async fn test_unknown_payment_id_is_dropped() {
        let (processor, _) = processor();
        let result = processor
            .reconcile(event(Uuid::new_v4(), "paid", None))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unknown_status_is_dropped() {
        let (processor, payments) = processor();
        let payment = pending_payment(&payments).await;

        let result = processor
            .reconcile(event(payment.id, "chargeback", None))
            .await
            .unwrap();
        assert!(result.is_none());

        let stored = payments.get(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }
}
