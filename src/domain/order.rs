use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Completed,
    InProgress,
    Cancelled,
}

/// Read-only view of an order as provided by the order collaborator.
///
/// Settlements are only ever generated for completed orders; the rest of the
/// order lifecycle lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub total_price: Money,
    pub completed_at: Option<DateTime<Utc>>,
    /// The helper assigned to carry out the delivery.
    pub helper_id: Uuid,
    /// The business customer that ordered the delivery.
    pub requester_id: Uuid,
    pub status: OrderStatus,
}

impl Order {
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}
