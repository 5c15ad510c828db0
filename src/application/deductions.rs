use crate::application::audit::AuditRecorder;
use crate::application::settlements::SettlementService;
use crate::domain::deduction::{Deduction, DeductionStatus, NewDeduction};
use crate::domain::money::{Amount, Money};
use crate::domain::ports::DeductionStoreRef;
use crate::error::{Result, SettlementError};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Tracks amounts subtracted from a helper's payable amount.
///
/// Applying a linked deduction increments the owning settlement's deduction
/// total through the settlement service's update path, so the net amount
/// stays consistent; cancelling reverses it symmetrically.
pub struct DeductionService {
    deductions: DeductionStoreRef,
    settlements: Arc<SettlementService>,
    audit: AuditRecorder,
}

impl DeductionService {
    pub fn new(
        deductions: DeductionStoreRef,
        settlements: Arc<SettlementService>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            deductions,
            settlements,
            audit,
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Deduction> {
        self.deductions
            .get(id)
            .await?
            .ok_or(SettlementError::not_found("deduction", id))
    }

    pub async fn create(&self, data: NewDeduction, actor_id: &str) -> Result<Deduction> {
        // Reject zero and negative amounts up front.
        Amount::new(data.amount.value())?;

        let deduction = Deduction::new(data, Utc::now());
        self.deductions.insert(deduction.clone()).await?;
        self.audit
            .record::<Deduction>(
                "deduction",
                deduction.id,
                "created",
                actor_id,
                None,
                &deduction,
                None,
            )
            .await?;
        Ok(deduction)
    }

    /// Attaches a pending deduction to a settlement after the fact.
    pub async fn link_to_settlement(
        &self,
        id: Uuid,
        settlement_id: Uuid,
        actor_id: &str,
    ) -> Result<Deduction> {
        let old = self.get(id).await?;
        if old.status != DeductionStatus::Pending {
            return Err(SettlementError::InvalidState(format!(
                "only pending deductions can be linked, {id} is {}",
                old.status
            )));
        }
        // The settlement must exist before linking.
        self.settlements.get(settlement_id).await?;

        let mut updated = old.clone();
        updated.settlement_id = Some(settlement_id);
        self.deductions.update(updated.clone()).await?;
        self.audit
            .record("deduction", id, "linked", actor_id, Some(&old), &updated, None)
            .await?;
        Ok(updated)
    }

    /// Applies a pending deduction. When linked to a settlement, the
    /// settlement's deduction total is incremented in the same call.
    ///
    /// The settlement adjustment runs first: if the settlement rejects it
    /// (already paid or cancelled) the deduction stays pending instead of
    /// ending up applied with no matching increment. The two writes are
    /// still not atomic (see design notes).
    pub async fn apply(&self, id: Uuid, actor_id: &str) -> Result<Deduction> {
        let old = self.get(id).await?;
        if old.status != DeductionStatus::Pending {
            return Err(SettlementError::InvalidState(format!(
                "deduction {id} is {} and cannot be applied",
                old.status
            )));
        }

        let mut updated = old.clone();
        updated.status = DeductionStatus::Applied;
        updated.applied_at = Some(Utc::now());

        if let Some(settlement_id) = updated.settlement_id {
            self.settlements
                .adjust_deductions(settlement_id, updated.amount, actor_id)
                .await?;
        }
        self.deductions.update(updated.clone()).await?;

        self.audit
            .record("deduction", id, "applied", actor_id, Some(&old), &updated, None)
            .await?;
        info!(deduction_id = %id, amount = %updated.amount, "deduction applied");
        Ok(updated)
    }

    /// Cancels a deduction. An already-applied, linked deduction reverses the
    /// settlement increment symmetrically (floored at zero by the settlement
    /// service).
    pub async fn cancel(&self, id: Uuid, actor_id: &str) -> Result<Deduction> {
        let old = self.get(id).await?;
        if old.status == DeductionStatus::Cancelled {
            return Err(SettlementError::InvalidState(format!(
                "deduction {id} is already cancelled"
            )));
        }

        let mut updated = old.clone();
        updated.status = DeductionStatus::Cancelled;

        // Reverse first for the same reason `apply` adjusts first: a
        // rejected reversal must leave the deduction applied.
        if old.status == DeductionStatus::Applied
            && let Some(settlement_id) = updated.settlement_id
        {
            self.settlements
                .adjust_deductions(settlement_id, Money::ZERO - updated.amount, actor_id)
                .await?;
        }
        self.deductions.update(updated.clone()).await?;

        self.audit
            .record("deduction", id, "cancelled", actor_id, Some(&old), &updated, None)
            .await?;
        Ok(updated)
    }
}
