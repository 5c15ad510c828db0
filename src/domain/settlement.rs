use crate::domain::money::Money;
use crate::error::{Result, SettlementError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Ready,
    Confirmed,
    Paid,
    OnHold,
    Cancelled,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Ready => "ready",
            SettlementStatus::Confirmed => "confirmed",
            SettlementStatus::Paid => "paid",
            SettlementStatus::OnHold => "on_hold",
            SettlementStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal settlements can never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SettlementStatus::Paid | SettlementStatus::Cancelled)
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The stateful record of what a helper is owed for one order.
///
/// Invariant: `net_amount == amount - deductions` after every mutation.
/// Settlements are never deleted, only moved to `cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: Uuid,
    pub order_id: Uuid,
    pub helper_id: Uuid,
    pub requester_id: Uuid,
    pub status: SettlementStatus,
    /// Gross payable before deductions (the order total).
    pub amount: Money,
    /// Running total of applied deductions.
    pub deductions: Money,
    pub net_amount: Money,
    pub due_date: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Free-form metadata; holds the advisory lock flag and hold/cancel reasons.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Settlement {
    pub fn new(
        order_id: Uuid,
        helper_id: Uuid,
        requester_id: Uuid,
        amount: Money,
        deductions: Money,
        now: DateTime<Utc>,
    ) -> Self {
        let mut settlement = Self {
            id: Uuid::new_v4(),
            order_id,
            helper_id,
            requester_id,
            status: SettlementStatus::Pending,
            amount,
            deductions,
            net_amount: Money::ZERO,
            due_date: None,
            confirmed_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
            metadata: Map::new(),
        };
        settlement.recompute_net();
        settlement
    }

    /// Re-derives `net_amount` from its operands. Called on every write path.
    pub fn recompute_net(&mut self) {
        self.net_amount = self.amount - self.deductions;
    }

    /// Validates and applies a status change.
    ///
    /// All transitions outside the table are rejected with `InvalidTransition`.
    pub fn transition(&mut self, to: SettlementStatus) -> Result<()> {
        use SettlementStatus::*;

        let allowed = match (self.status, to) {
            (Pending, Ready) => true,
            (Pending | Ready, Confirmed) => true,
            (Confirmed, Paid) => true,
            // Re-holding an already held settlement is allowed, e.g. to
            // replace the hold reason.
            (from, OnHold) => !from.is_terminal(),
            (OnHold, Ready) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        };

        if !allowed {
            return Err(SettlementError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }

        self.status = to;
        Ok(())
    }

    /// Advisory lock flag stored in metadata; nothing enforces it against
    /// concurrent writers.
    pub fn is_locked(&self) -> bool {
        self.metadata
            .get("locked")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_locked(&mut self, locked: bool, reason: Option<String>) {
        self.metadata.insert("locked".to_string(), Value::Bool(locked));
        match reason {
            Some(reason) => {
                self.metadata
                    .insert("lock_reason".to_string(), Value::String(reason));
            }
            None => {
                self.metadata.remove("lock_reason");
            }
        }
    }

    pub fn set_note(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), Value::String(value));
    }
}
