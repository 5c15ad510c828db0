use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Sent,
    Succeeded,
    Failed,
    Cancelled,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Sent => "sent",
            PayoutStatus::Succeeded => "succeeded",
            PayoutStatus::Failed => "failed",
            PayoutStatus::Cancelled => "cancelled",
        }
    }

    /// A payout in one of these states blocks creating another one for the
    /// same settlement.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PayoutStatus::Pending | PayoutStatus::Sent | PayoutStatus::Succeeded
        )
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An attempted transfer of a settlement's net amount to the helper.
///
/// The amount is copied from the settlement's net amount at creation time and
/// never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: Uuid,
    pub settlement_id: Uuid,
    pub helper_id: Uuid,
    pub amount: Money,
    pub status: PayoutStatus,
    pub method: String,
    pub account_info: String,
    pub retry_count: u32,
    pub failure_reason: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub succeeded_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payout {
    pub fn new(
        settlement_id: Uuid,
        helper_id: Uuid,
        amount: Money,
        method: String,
        account_info: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            settlement_id,
            helper_id,
            amount,
            status: PayoutStatus::Pending,
            method,
            account_info,
            retry_count: 0,
            failure_reason: None,
            sent_at: None,
            succeeded_at: None,
            failed_at: None,
            created_at: now,
        }
    }
}

/// Request handed to the payout gateway; actual money movement is out of scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRequest {
    pub payout_id: Uuid,
    pub settlement_id: Uuid,
    pub amount: Money,
    pub method: String,
    pub account_info: String,
}

impl PayoutRequest {
    pub fn for_payout(payout: &Payout) -> Self {
        Self {
            payout_id: payout.id,
            settlement_id: payout.settlement_id,
            amount: payout.amount,
            method: payout.method.clone(),
            account_info: payout.account_info.clone(),
        }
    }
}
