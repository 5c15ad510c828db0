use crate::application::audit::AuditRecorder;
use crate::domain::money::Money;
use crate::domain::order::Order;
use crate::domain::ports::{DeductionStoreRef, OrderStoreRef, SettlementStoreRef};
use crate::domain::settlement::Settlement;
use crate::error::{Result, SettlementError};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Platform commission taken off the order total.
    pub platform_fee_rate: Decimal,
    /// Days after creation until the settlement falls due.
    pub settlement_term_days: i64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            platform_fee_rate: dec!(0.10),
            settlement_term_days: 7,
        }
    }
}

/// Payable summary derived from one completed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub total_amount: Money,
    pub platform_fee: Money,
    pub total_deductions: Money,
    pub helper_payout: Money,
}

/// Derives payable amounts from completed orders and creates settlements.
pub struct SettlementCalculator {
    orders: OrderStoreRef,
    deductions: DeductionStoreRef,
    settlements: SettlementStoreRef,
    audit: AuditRecorder,
    config: CalculatorConfig,
}

impl SettlementCalculator {
    pub fn new(
        orders: OrderStoreRef,
        deductions: DeductionStoreRef,
        settlements: SettlementStoreRef,
        audit: AuditRecorder,
        config: CalculatorConfig,
    ) -> Self {
        Self {
            orders,
            deductions,
            settlements,
            audit,
            config,
        }
    }

    async fn completed_order(&self, order_id: Uuid) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(SettlementError::not_found("order", order_id))?;
        if !order.is_completed() {
            return Err(SettlementError::InvalidState(format!(
                "order {order_id} is not completed"
            )));
        }
        Ok(order)
    }

    /// Pure derivation of the payable summary; safe to call repeatedly
    /// without side effects.
    pub async fn calculate_summary(&self, order_id: Uuid) -> Result<OrderSummary> {
        let order = self.completed_order(order_id).await?;

        let total_deductions = self
            .deductions
            .applied_for_order(order_id)
            .await?
            .iter()
            .fold(Money::ZERO, |acc, d| acc + d.amount);

        let platform_fee = order.total_price.times(self.config.platform_fee_rate);
        let helper_payout = order.total_price - platform_fee - total_deductions;

        Ok(OrderSummary {
            order_id,
            total_amount: order.total_price,
            platform_fee,
            total_deductions,
            helper_payout,
        })
    }

    /// Creates the pending settlement for one order, once. The settlement
    /// carries the gross order total; the platform fee stays a reporting
    /// concern of the summary.
    pub async fn generate_for_order(&self, order_id: Uuid, actor_id: &str) -> Result<Settlement> {
        if let Some(existing) = self.settlements.find_by_order(order_id).await? {
            return Err(SettlementError::InvalidState(format!(
                "order {order_id} already has settlement {}",
                existing.id
            )));
        }

        let order = self.completed_order(order_id).await?;
        let summary = self.calculate_summary(order_id).await?;

        let now = Utc::now();
        let mut settlement = Settlement::new(
            order_id,
            order.helper_id,
            order.requester_id,
            summary.total_amount,
            summary.total_deductions,
            now,
        );
        settlement.due_date = Some(now + Duration::days(self.config.settlement_term_days));

        self.settlements.insert(settlement.clone()).await?;
        self.audit
            .record::<Settlement>(
                "settlement",
                settlement.id,
                "created",
                actor_id,
                None,
                &settlement,
                None,
            )
            .await?;
        info!(settlement_id = %settlement.id, order_id = %order_id, net = %settlement.net_amount,
            "settlement generated");
        Ok(settlement)
    }

    /// Generates settlements for every order completed within the month.
    ///
    /// Orders that already have a settlement are skipped, so the batch is
    /// safely re-runnable. Per-order failures are logged and excluded.
    pub async fn generate_monthly(
        &self,
        year: i32,
        month: u32,
        actor_id: &str,
    ) -> Result<Vec<Settlement>> {
        let (from, to) = month_bounds(year, month)?;
        let orders = self.orders.completed_between(from, to).await?;

        let mut generated = Vec::new();
        for order in orders {
            if self.settlements.find_by_order(order.id).await?.is_some() {
                debug!(order_id = %order.id, "order already settled, skipping");
                continue;
            }
            match self.generate_for_order(order.id, actor_id).await {
                Ok(settlement) => generated.push(settlement),
                Err(e) => warn!(order_id = %order.id, error = %e, "monthly generation skipped order"),
            }
        }
        info!(year, month, count = generated.len(), "monthly settlement generation finished");
        Ok(generated)
    }
}

pub(crate) fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| SettlementError::Validation(format!("invalid month {year}-{month}")))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| SettlementError::Validation(format!("invalid month {year}-{month}")))?;

    Ok((
        Utc.from_utc_datetime(&start.and_time(chrono::NaiveTime::MIN)),
        Utc.from_utc_datetime(&end.and_time(chrono::NaiveTime::MIN)),
    ))
}
