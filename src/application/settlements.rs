use crate::application::audit::AuditRecorder;
use crate::domain::money::Money;
use crate::domain::ports::SettlementStoreRef;
use crate::domain::settlement::{Settlement, SettlementStatus};
use crate::error::{Result, SettlementError};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

/// Owns the settlement lifecycle.
///
/// Every mutating operation recomputes the net amount before persisting and
/// writes one audit entry capturing the full before/after snapshot and the
/// initiating actor.
pub struct SettlementService {
    settlements: SettlementStoreRef,
    audit: AuditRecorder,
}

impl SettlementService {
    pub fn new(settlements: SettlementStoreRef, audit: AuditRecorder) -> Self {
        Self { settlements, audit }
    }

    pub async fn get(&self, id: Uuid) -> Result<Settlement> {
        self.settlements
            .get(id)
            .await?
            .ok_or(SettlementError::not_found("settlement", id))
    }

    async fn persist(
        &self,
        old: &Settlement,
        mut new: Settlement,
        action: &str,
        actor_id: &str,
        notes: Option<String>,
    ) -> Result<Settlement> {
        new.recompute_net();
        new.updated_at = Utc::now();
        self.settlements.update(new.clone()).await?;
        self.audit
            .record("settlement", new.id, action, actor_id, Some(old), &new, notes)
            .await?;
        Ok(new)
    }

    pub async fn mark_ready(&self, id: Uuid, actor_id: &str) -> Result<Settlement> {
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.transition(SettlementStatus::Ready)?;
        self.persist(&old, updated, "marked_ready", actor_id, None).await
    }

    pub async fn confirm(&self, id: Uuid, actor_id: &str) -> Result<Settlement> {
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.transition(SettlementStatus::Confirmed)?;
        updated.confirmed_at = Some(Utc::now());
        self.persist(&old, updated, "confirmed", actor_id, None).await
    }

    /// Only reachable from `confirmed`; the payout processor calls this when
    /// a payout succeeds.
    pub async fn mark_paid(&self, id: Uuid, actor_id: &str) -> Result<Settlement> {
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.transition(SettlementStatus::Paid)?;
        updated.paid_at = Some(Utc::now());
        self.persist(&old, updated, "paid", actor_id, None).await
    }

    pub async fn hold(&self, id: Uuid, reason: &str, actor_id: &str) -> Result<Settlement> {
        if reason.trim().is_empty() {
            return Err(SettlementError::Validation(
                "hold requires a reason".to_string(),
            ));
        }
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.transition(SettlementStatus::OnHold)?;
        updated.set_note("hold_reason", reason.to_string());
        self.persist(&old, updated, "held", actor_id, Some(reason.to_string()))
            .await
    }

    pub async fn release(&self, id: Uuid, actor_id: &str) -> Result<Settlement> {
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.transition(SettlementStatus::Ready)?;
        self.persist(&old, updated, "released", actor_id, None).await
    }

    pub async fn cancel(&self, id: Uuid, reason: &str, actor_id: &str) -> Result<Settlement> {
        if reason.trim().is_empty() {
            return Err(SettlementError::Validation(
                "cancel requires a reason".to_string(),
            ));
        }
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.transition(SettlementStatus::Cancelled)?;
        updated.set_note("cancel_reason", reason.to_string());
        self.persist(&old, updated, "cancelled", actor_id, Some(reason.to_string()))
            .await
    }

    /// Toggles the advisory metadata lock without changing status.
    pub async fn lock(&self, id: Uuid, reason: &str, actor_id: &str) -> Result<Settlement> {
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.set_locked(true, Some(reason.to_string()));
        self.persist(&old, updated, "locked", actor_id, Some(reason.to_string()))
            .await
    }

    pub async fn unlock(&self, id: Uuid, actor_id: &str) -> Result<Settlement> {
        let old = self.get(id).await?;
        let mut updated = old.clone();
        updated.set_locked(false, None);
        self.persist(&old, updated, "unlocked", actor_id, None).await
    }

    /// Adjusts the running deduction total by `delta` (negative to reverse),
    /// floored at zero. The deduction ledger goes through this path so the
    /// net amount stays consistent.
    ///
    /// Rejected on paid or cancelled settlements: adjusting after payout
    /// would silently desynchronize the paid amount from the ledger.
    pub async fn adjust_deductions(
        &self,
        id: Uuid,
        delta: Money,
        actor_id: &str,
    ) -> Result<Settlement> {
        let old = self.get(id).await?;
        if old.status.is_terminal() {
            return Err(SettlementError::InvalidState(format!(
                "cannot adjust deductions on {} settlement {}",
                old.status, old.id
            )));
        }
        let mut updated = old.clone();
        updated.deductions = (updated.deductions + delta).max_zero();
        self.persist(&old, updated, "deductions_adjusted", actor_id, None)
            .await
    }

    /// Confirms each settlement independently; failures are logged with
    /// context and excluded from the result set, one bad id never aborts
    /// the rest.
    pub async fn batch_confirm(&self, ids: &[Uuid], actor_id: &str) -> Vec<Settlement> {
        let mut confirmed = Vec::new();
        for &id in ids {
            match self.confirm(id, actor_id).await {
                Ok(settlement) => confirmed.push(settlement),
                Err(e) => warn!(settlement_id = %id, error = %e, "batch confirm skipped"),
            }
        }
        confirmed
    }

    /// Marks each settlement paid independently, with the same partial
    /// failure policy as `batch_confirm`.
    pub async fn batch_pay(&self, ids: &[Uuid], actor_id: &str) -> Vec<Settlement> {
        let mut paid = Vec::new();
        for &id in ids {
            match self.mark_paid(id, actor_id).await {
                Ok(settlement) => paid.push(settlement),
                Err(e) => warn!(settlement_id = %id, error = %e, "batch pay skipped"),
            }
        }
        paid
    }
}
