use crate::application::calculator::month_bounds;
use crate::domain::money::Money;
use crate::domain::ports::{OrderStoreRef, SettlementStoreRef};
use crate::domain::settlement::{Settlement, SettlementStatus};
use crate::error::{Result, SettlementError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

const STATUS_ORDER: [SettlementStatus; 6] = [
    SettlementStatus::Pending,
    SettlementStatus::Ready,
    SettlementStatus::Confirmed,
    SettlementStatus::Paid,
    SettlementStatus::OnHold,
    SettlementStatus::Cancelled,
];

/// Count and amounts for one settlement status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub status: SettlementStatus,
    pub count: usize,
    pub gross: Money,
    pub net: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub by_status: Vec<StatusBreakdown>,
    pub total_count: usize,
    pub total_net: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelperReport {
    pub helper_id: Uuid,
    pub by_status: Vec<StatusBreakdown>,
    pub total_count: usize,
    pub total_paid: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub by_status: Vec<StatusBreakdown>,
    pub total_count: usize,
    pub total_net: Money,
}

/// Confirmed settlements whose due date has passed.
#[derive(Debug, Clone, Serialize)]
pub struct OutstandingReport {
    pub as_of: DateTime<Utc>,
    pub settlements: Vec<Settlement>,
    pub total_net: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValidationIssue {
    MissingOrder(Uuid),
    HelperMismatch { settlement: Uuid, order: Uuid },
    RequesterMismatch { settlement: Uuid, order: Uuid },
    NetMismatch { expected: Money, actual: Money },
    NegativeNet(Money),
}

/// Advisory consistency report for one settlement: inspectable, never a hard
/// gate.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub settlement_id: Uuid,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Read-only aggregates over the settlement store for the admin surface.
pub struct ReportService {
    settlements: SettlementStoreRef,
    orders: OrderStoreRef,
}

impl ReportService {
    pub fn new(settlements: SettlementStoreRef, orders: OrderStoreRef) -> Self {
        Self {
            settlements,
            orders,
        }
    }

    fn breakdown(settlements: &[Settlement]) -> Vec<StatusBreakdown> {
        STATUS_ORDER
            .iter()
            .map(|&status| {
                let matching: Vec<&Settlement> =
                    settlements.iter().filter(|s| s.status == status).collect();
                StatusBreakdown {
                    status,
                    count: matching.len(),
                    gross: matching.iter().fold(Money::ZERO, |acc, s| acc + s.amount),
                    net: matching
                        .iter()
                        .fold(Money::ZERO, |acc, s| acc + s.net_amount),
                }
            })
            .collect()
    }

    fn total_net(settlements: &[Settlement]) -> Money {
        settlements
            .iter()
            .fold(Money::ZERO, |acc, s| acc + s.net_amount)
    }

    pub async fn daily_report(&self, date: NaiveDate) -> Result<DailyReport> {
        let settlements: Vec<Settlement> = self
            .settlements
            .all()
            .await?
            .into_iter()
            .filter(|s| s.created_at.date_naive() == date)
            .collect();

        Ok(DailyReport {
            date,
            by_status: Self::breakdown(&settlements),
            total_count: settlements.len(),
            total_net: Self::total_net(&settlements),
        })
    }

    pub async fn helper_report(&self, helper_id: Uuid) -> Result<HelperReport> {
        let settlements = self.settlements.by_helper(helper_id).await?;
        let total_paid = settlements
            .iter()
            .filter(|s| s.status == SettlementStatus::Paid)
            .fold(Money::ZERO, |acc, s| acc + s.net_amount);

        Ok(HelperReport {
            helper_id,
            total_count: settlements.len(),
            total_paid,
            by_status: Self::breakdown(&settlements),
        })
    }

    pub async fn monthly_report(&self, year: i32, month: u32) -> Result<MonthlyReport> {
        let (from, to) = month_bounds(year, month)?;
        let settlements: Vec<Settlement> = self
            .settlements
            .all()
            .await?
            .into_iter()
            .filter(|s| s.created_at >= from && s.created_at < to)
            .collect();

        Ok(MonthlyReport {
            year,
            month,
            total_count: settlements.len(),
            total_net: Self::total_net(&settlements),
            by_status: Self::breakdown(&settlements),
        })
    }

    pub async fn outstanding_report(&self, as_of: DateTime<Utc>) -> Result<OutstandingReport> {
        let settlements: Vec<Settlement> = self
            .settlements
            .by_status(SettlementStatus::Confirmed)
            .await?
            .into_iter()
            .filter(|s| s.due_date.map(|due| due < as_of).unwrap_or(false))
            .collect();

        Ok(OutstandingReport {
            as_of,
            total_net: Self::total_net(&settlements),
            settlements,
        })
    }

    /// Existence and amount-consistency checks for one settlement.
    pub async fn validate(&self, settlement_id: Uuid) -> Result<ValidationReport> {
        let settlement = self
            .settlements
            .get(settlement_id)
            .await?
            .ok_or(SettlementError::not_found("settlement", settlement_id))?;

        let mut issues = Vec::new();

        match self.orders.get(settlement.order_id).await? {
            None => issues.push(ValidationIssue::MissingOrder(settlement.order_id)),
            Some(order) => {
                if order.helper_id != settlement.helper_id {
                    issues.push(ValidationIssue::HelperMismatch {
                        settlement: settlement.id,
                        order: order.id,
                    });
                }
                if order.requester_id != settlement.requester_id {
                    issues.push(ValidationIssue::RequesterMismatch {
                        settlement: settlement.id,
                        order: order.id,
                    });
                }
            }
        }

        let expected = settlement.amount - settlement.deductions;
        if settlement.net_amount != expected {
            issues.push(ValidationIssue::NetMismatch {
                expected,
                actual: settlement.net_amount,
            });
        }
        if settlement.net_amount.is_negative() {
            issues.push(ValidationIssue::NegativeNet(settlement.net_amount));
        }

        Ok(ValidationReport {
            settlement_id,
            issues,
        })
    }
}
