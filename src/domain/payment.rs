use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Ordered escalation stage for overdue payments.
///
/// A single ordered enum replaces independent latch timestamps: the stage can
/// only move forward, which makes every staged action effectively-once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OverdueStage {
    #[default]
    Normal,
    Warning,
    Overdue,
    Collection,
    Legal,
}

impl OverdueStage {
    /// Maps days past due to a stage. Bands are non-overlapping and gapless.
    pub fn for_days(overdue_days: i64) -> Self {
        match overdue_days {
            i64::MIN..=0 => OverdueStage::Normal,
            1..=6 => OverdueStage::Warning,
            7..=13 => OverdueStage::Overdue,
            14..=29 => OverdueStage::Collection,
            _ => OverdueStage::Legal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverdueStage::Normal => "normal",
            OverdueStage::Warning => "warning",
            OverdueStage::Overdue => "overdue",
            OverdueStage::Collection => "collection",
            OverdueStage::Legal => "legal",
        }
    }
}

impl fmt::Display for OverdueStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Daily-rate late interest, rounded to 2 decimal places.
///
/// `amount * (annual_rate / 365) * overdue_days`
pub fn late_interest(amount: Money, overdue_days: i64, annual_rate: Decimal) -> Money {
    if overdue_days <= 0 {
        return Money::ZERO;
    }
    amount
        .times(annual_rate / dec!(365) * Decimal::from(overdue_days))
        .rounded()
}

/// The requester-side obligation to pay for an order.
///
/// Distinct from a settlement: this is money owed *by* the requester, not
/// *to* the helper. Overdue fields are derived state recomputed by the
/// escalation scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub requester_id: Uuid,
    pub amount: Money,
    pub status: PaymentStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub overdue_days: i64,
    /// Current banded stage, derived from `overdue_days`. Never regresses.
    pub overdue_stage: OverdueStage,
    /// High-water mark of one-shot escalation actions already performed.
    pub escalated_stage: OverdueStage,
    pub late_interest: Money,
    pub reminder_sent_count: u32,
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
    pub stage_changed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        order_id: Uuid,
        requester_id: Uuid,
        amount: Money,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            requester_id,
            amount,
            status: PaymentStatus::Pending,
            due_date,
            overdue_days: 0,
            overdue_stage: OverdueStage::Normal,
            escalated_stage: OverdueStage::Normal,
            late_interest: Money::ZERO,
            reminder_sent_count: 0,
            last_reminder_sent_at: None,
            stage_changed_at: None,
            failure_reason: None,
            paid_at: None,
            created_at: now,
        }
    }

    /// Whole days elapsed past the due date at `now`, if any.
    pub fn days_past_due(&self, now: DateTime<Utc>) -> Option<i64> {
        self.due_date.map(|due| (now - due).num_days())
    }

    /// Advances the banded stage; returns true when the stage moved.
    /// The stage is monotone, a smaller target is ignored.
    pub fn advance_stage(&mut self, target: OverdueStage, now: DateTime<Utc>) -> bool {
        if target > self.overdue_stage {
            self.overdue_stage = target;
            self.stage_changed_at = Some(now);
            true
        } else {
            false
        }
    }
}
