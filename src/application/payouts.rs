use crate::application::audit::AuditRecorder;
use crate::application::settlements::SettlementService;
use crate::domain::payout::{Payout, PayoutRequest, PayoutStatus};
use crate::domain::ports::{PayoutGatewayRef, PayoutStoreRef};
use crate::domain::settlement::SettlementStatus;
use crate::error::{Result, SettlementError};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Requests and tracks the release of money to a helper.
///
/// Payouts exist only for confirmed settlements; a succeeded payout is the
/// sole trigger that flips the owning settlement to paid. Retries are always
/// externally triggered, never automatic.
pub struct PayoutService {
    payouts: PayoutStoreRef,
    settlements: Arc<SettlementService>,
    gateway: PayoutGatewayRef,
    audit: AuditRecorder,
}

impl PayoutService {
    pub fn new(
        payouts: PayoutStoreRef,
        settlements: Arc<SettlementService>,
        gateway: PayoutGatewayRef,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            payouts,
            settlements,
            gateway,
            audit,
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Payout> {
        self.payouts
            .get(id)
            .await?
            .ok_or(SettlementError::not_found("payout", id))
    }

    /// Creates a pending payout for a confirmed settlement, copying the
    /// settlement's current net amount. A second payout is rejected while an
    /// earlier one is still pending, sent or succeeded.
    pub async fn create(
        &self,
        settlement_id: Uuid,
        method: &str,
        account_info: &str,
        actor_id: &str,
    ) -> Result<Payout> {
        let settlement = self.settlements.get(settlement_id).await?;
        if settlement.status != SettlementStatus::Confirmed {
            return Err(SettlementError::InvalidState(format!(
                "payout requires a confirmed settlement, {} is {}",
                settlement_id, settlement.status
            )));
        }

        if let Some(active) = self
            .payouts
            .by_settlement(settlement_id)
            .await?
            .into_iter()
            .find(|p| p.status.is_active())
        {
            return Err(SettlementError::InvalidState(format!(
                "settlement {settlement_id} already has {} payout {}",
                active.status, active.id
            )));
        }

        let payout = Payout::new(
            settlement_id,
            settlement.helper_id,
            settlement.net_amount,
            method.to_string(),
            account_info.to_string(),
            Utc::now(),
        );
        self.payouts.insert(payout.clone()).await?;
        self.audit
            .record::<Payout>("payout", payout.id, "created", actor_id, None, &payout, None)
            .await?;
        Ok(payout)
    }

    /// Applies a status reported by the gateway (or an operator).
    ///
    /// `sent` submits the request to the gateway and stamps `sent_at`;
    /// `succeeded` stamps `succeeded_at` and marks the owning settlement
    /// paid; `failed` stamps `failed_at` and records the reason. Only
    /// `pending -> sent`, `pending|sent -> succeeded|failed` and
    /// `pending -> cancelled` are accepted, so a payout is submitted to
    /// the gateway at most once and terminal payouts stay terminal.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: PayoutStatus,
        actor_id: &str,
        failure_reason: Option<String>,
    ) -> Result<Payout> {
        let old = self.get(id).await?;

        let allowed = matches!(
            (old.status, new_status),
            (PayoutStatus::Pending, PayoutStatus::Sent)
                | (
                    PayoutStatus::Pending | PayoutStatus::Sent,
                    PayoutStatus::Succeeded | PayoutStatus::Failed
                )
                | (PayoutStatus::Pending, PayoutStatus::Cancelled)
        );
        if !allowed {
            return Err(SettlementError::InvalidState(format!(
                "payout {id} cannot go {} -> {}",
                old.status, new_status
            )));
        }

        let now = Utc::now();
        let mut updated = old.clone();
        updated.status = new_status;

        match new_status {
            PayoutStatus::Sent => {
                self.gateway.submit(PayoutRequest::for_payout(&old)).await?;
                updated.sent_at = Some(now);
            }
            PayoutStatus::Succeeded => {
                updated.succeeded_at = Some(now);
            }
            PayoutStatus::Failed => {
                updated.failed_at = Some(now);
                updated.failure_reason = failure_reason.clone();
            }
            PayoutStatus::Pending | PayoutStatus::Cancelled => {}
        }

        self.payouts.update(updated.clone()).await?;
        self.audit
            .record(
                "payout",
                id,
                &format!("status_{}", new_status),
                actor_id,
                Some(&old),
                &updated,
                failure_reason,
            )
            .await?;

        if new_status == PayoutStatus::Succeeded {
            self.settlements
                .mark_paid(updated.settlement_id, actor_id)
                .await?;
            info!(payout_id = %id, settlement_id = %updated.settlement_id, "payout succeeded, settlement paid");
        }

        Ok(updated)
    }

    /// Resets a failed payout to pending, clears the failure reason and
    /// counts the retry. Only meaningful from `failed`.
    pub async fn retry(&self, id: Uuid, actor_id: &str) -> Result<Payout> {
        let old = self.get(id).await?;
        if old.status != PayoutStatus::Failed {
            return Err(SettlementError::InvalidState(format!(
                "only failed payouts can be retried, {id} is {}",
                old.status
            )));
        }

        let mut updated = old.clone();
        updated.status = PayoutStatus::Pending;
        updated.failure_reason = None;
        updated.retry_count += 1;
        self.payouts.update(updated.clone()).await?;
        self.audit
            .record("payout", id, "retried", actor_id, Some(&old), &updated, None)
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::ports::SettlementStore;
    use crate::domain::settlement::Settlement;
    use crate::infrastructure::in_memory::{
        InMemoryAuditLogStore, InMemoryPayoutStore, InMemorySettlementStore,
        RecordingPayoutGateway,
    };
    use rust_decimal_macros::dec;

    struct Fixture {
        service: PayoutService,
        settlements: Arc<SettlementService>,
        gateway: RecordingPayoutGateway,
        settlement: Settlement,
    }

    async fn fixture(confirm: bool) -> Fixture {
        let settlement_store = InMemorySettlementStore::new();
        let audit = AuditRecorder::new(Arc::new(InMemoryAuditLogStore::new()));
        let settlements = Arc::new(SettlementService::new(
            Arc::new(settlement_store.clone()),
            audit.clone(),
        ));
        let gateway = RecordingPayoutGateway::new();
        let service = PayoutService::new(
            Arc::new(InMemoryPayoutStore::new()),
            settlements.clone(),
            Arc::new(gateway.clone()),
            audit,
        );

        let settlement = Settlement::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::new(dec!(90000)),
            Money::ZERO,
            Utc::now(),
        );
        settlement_store.insert(settlement.clone()).await.unwrap();
        let settlement = if confirm {
            settlements.confirm(settlement.id, "admin-1").await.unwrap()
        } else {
            settlement
        };

        Fixture {
            service,
            settlements,
            gateway,
            settlement,
        }
    }

    #[tokio::test]
    async fn test_create_requires_confirmed_settlement() {
        let f = fixture(false).await;
        let err = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_create_copies_net_amount() {
        let f = fixture(true).await;
        let payout = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap();
        assert_eq!(payout.amount, f.settlement.net_amount);
        assert_eq!(payout.status, PayoutStatus::Pending);
    }

    #[tokio::test]
    async fn test_duplicate_payout_blocked_while_active() {
        let f = fixture(true).await;
        f.service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap();
        let err = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_sent_submits_to_gateway() {
        let f = fixture(true).await;
        let payout = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap();

        let sent = f
            .service
            .update_status(payout.id, PayoutStatus::Sent, "admin-1", None)
            .await
            .unwrap();
        assert!(sent.sent_at.is_some());

        let requests = f.gateway.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].payout_id, payout.id);
        assert_eq!(requests[0].amount, payout.amount);
    }

    #[tokio::test]
    async fn test_double_sent_submits_gateway_once() {
        let f = fixture(true).await;
        let payout = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap();

        f.service
            .update_status(payout.id, PayoutStatus::Sent, "admin-1", None)
            .await
            .unwrap();
        let err = f
            .service
            .update_status(payout.id, PayoutStatus::Sent, "admin-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidState(_)));

        assert_eq!(f.gateway.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_payouts_reject_updates() {
        let f = fixture(true).await;
        let payout = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap();
        f.service
            .update_status(payout.id, PayoutStatus::Succeeded, "gateway", None)
            .await
            .unwrap();

        for to in [
            PayoutStatus::Sent,
            PayoutStatus::Failed,
            PayoutStatus::Cancelled,
        ] {
            let err = f
                .service
                .update_status(payout.id, to, "admin-1", None)
                .await
                .unwrap_err();
            assert!(matches!(err, SettlementError::InvalidState(_)), "{to}");
        }
    }

    #[tokio::test]
    async fn test_succeeded_marks_settlement_paid() {
        let f = fixture(true).await;
        let payout = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap();

        f.service
            .update_status(payout.id, PayoutStatus::Succeeded, "gateway", None)
            .await
            .unwrap();

        let settlement = f.settlements.get(f.settlement.id).await.unwrap();
        assert_eq!(settlement.status, SettlementStatus::Paid);
        assert!(settlement.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_retry_only_from_failed() {
        let f = fixture(true).await;
        let payout = f
            .service
            .create(f.settlement.id, "bank_transfer", "acct-1", "admin-1")
            .await
            .unwrap();

        let err = f.service.retry(payout.id, "admin-1").await.unwrap_err();
        assert!(matches!(err, SettlementError::InvalidState(_)));

        f.service
            .update_status(
                payout.id,
                PayoutStatus::Failed,
                "gateway",
                Some("account closed".to_string()),
            )
            .await
            .unwrap();

        let retried = f.service.retry(payout.id, "admin-1").await.unwrap();
        assert_eq!(retried.status, PayoutStatus::Pending);
        assert_eq!(retried.retry_count, 1);
        assert!(retried.failure_reason.is_none());

        // A retried payout may be created again only through the same record.
        let failed = f.service.get(payout.id).await.unwrap();
        assert_eq!(failed.status, PayoutStatus::Pending);
    }
}
