use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    Damage,
    Penalty,
    MissingItems,
    QualityIssue,
    CancellationFee,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionStatus {
    Pending,
    Applied,
    Cancelled,
}

impl fmt::Display for DeductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeductionStatus::Pending => "pending",
            DeductionStatus::Applied => "applied",
            DeductionStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// An amount subtracted from a helper's payable total.
///
/// A deduction is created independently of a settlement, then optionally
/// linked and applied. Deductions not linked to any settlement are
/// informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub id: Uuid,
    pub settlement_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub helper_id: Uuid,
    pub kind: DeductionKind,
    pub amount: Money,
    pub reason: String,
    pub status: DeductionStatus,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for a new deduction.
#[derive(Debug, Clone)]
pub struct NewDeduction {
    pub settlement_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub helper_id: Uuid,
    pub kind: DeductionKind,
    pub amount: Money,
    pub reason: String,
}

impl Deduction {
    pub fn new(data: NewDeduction, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            settlement_id: data.settlement_id,
            order_id: data.order_id,
            helper_id: data.helper_id,
            kind: data.kind,
            amount: data.amount,
            reason: data.reason,
            status: DeductionStatus::Pending,
            applied_at: None,
            created_at: now,
        }
    }
}
