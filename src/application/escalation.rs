use crate::application::audit::AuditRecorder;
use crate::domain::payment::{OverdueStage, Payment, late_interest};
use crate::domain::ports::{NotificationSinkRef, PaymentStoreRef};
use crate::error::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Escalation schedule configuration.
#[derive(Debug, Clone)]
pub struct EscalatorConfig {
    /// Annual late-interest rate applied pro rata per overdue day.
    pub annual_interest_rate: Decimal,
    /// Minimum hours between two reminders for the same payment.
    pub reminder_cooldown_hours: i64,
    /// UTC hour at which the daily stage dispatch runs (0-23).
    pub dispatch_hour: u32,
    /// Seconds between overdue recompute passes.
    pub recompute_interval_secs: u64,
}

impl Default for EscalatorConfig {
    fn default() -> Self {
        Self {
            annual_interest_rate: dec!(0.15),
            reminder_cooldown_hours: 24,
            dispatch_hour: 2,
            recompute_interval_secs: 3600,
        }
    }
}

/// Result of one recompute pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecomputeOutcome {
    pub scanned: usize,
    pub overdue: usize,
    pub failures: usize,
}

/// Result of one stage dispatch pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchOutcome {
    pub scanned: usize,
    pub reminders: usize,
    pub restrictions: usize,
    pub collections: usize,
    pub legal_actions: usize,
    pub failures: usize,
    /// True when the pass was skipped because another one was running.
    pub skipped: bool,
}

/// Background process that recomputes how overdue each pending payment is
/// and fires exactly one staged action per payment per dispatch pass.
///
/// The dispatch guard is process-local; running more than one instance gives
/// no cross-instance exclusion beyond the one-way stage ordering.
pub struct OverdueEscalator {
    payments: PaymentStoreRef,
    notifications: NotificationSinkRef,
    audit: AuditRecorder,
    config: EscalatorConfig,
    dispatch_running: AtomicBool,
}

impl OverdueEscalator {
    pub fn new(
        payments: PaymentStoreRef,
        notifications: NotificationSinkRef,
        audit: AuditRecorder,
        config: EscalatorConfig,
    ) -> Self {
        Self {
            payments,
            notifications,
            audit,
            config,
            dispatch_running: AtomicBool::new(false),
        }
    }

    /// Hourly pass: rewrites the derived overdue fields of every pending
    /// payment with a due date. Idempotent, so it carries no overlap guard.
    pub async fn run_overdue_recompute(&self, now: DateTime<Utc>) -> Result<RecomputeOutcome> {
        let mut outcome = RecomputeOutcome::default();

        for payment in self.payments.pending_with_due_date().await? {
            outcome.scanned += 1;
            match self.recompute_payment(payment, now).await {
                Ok(true) => outcome.overdue += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome.failures += 1;
                    error!(error = %e, "overdue recompute failed for payment");
                }
            }
        }

        info!(
            scanned = outcome.scanned,
            failures = outcome.failures,
            "overdue recompute pass finished"
        );
        Ok(outcome)
    }

    async fn recompute_payment(&self, payment: Payment, now: DateTime<Utc>) -> Result<bool> {
        let Some(diff_days) = payment.days_past_due(now) else {
            return Ok(false);
        };
        if diff_days <= 0 {
            return Ok(false);
        }

        let mut updated = payment;
        updated.overdue_days = diff_days;
        updated.late_interest =
            late_interest(updated.amount, diff_days, self.config.annual_interest_rate);
        updated.advance_stage(OverdueStage::for_days(diff_days), now);
        self.payments.update(updated).await?;
        Ok(true)
    }

    /// Daily pass: fires at most one staged action per overdue payment.
    ///
    /// A process-local guard prevents the pass from overlapping itself; the
    /// guard is reset on every exit path. A failure in one payment is logged
    /// and does not abort the rest of the batch.
    pub async fn run_stage_dispatch(&self, now: DateTime<Utc>) -> Result<DispatchOutcome> {
        if self.dispatch_running.swap(true, Ordering::SeqCst) {
            warn!("stage dispatch already running, skipping this pass");
            return Ok(DispatchOutcome {
                skipped: true,
                ..DispatchOutcome::default()
            });
        }

        let result = self.dispatch_all(now).await;
        self.dispatch_running.store(false, Ordering::SeqCst);

        match &result {
            Ok(outcome) => info!(
                scanned = outcome.scanned,
                reminders = outcome.reminders,
                restrictions = outcome.restrictions,
                collections = outcome.collections,
                legal_actions = outcome.legal_actions,
                failures = outcome.failures,
                "stage dispatch pass finished"
            ),
            Err(e) => error!(error = %e, "stage dispatch pass failed"),
        }
        result
    }

    async fn dispatch_all(&self, now: DateTime<Utc>) -> Result<DispatchOutcome> {
        let mut outcome = DispatchOutcome::default();

        for payment in self.payments.pending_with_due_date().await? {
            if payment.overdue_days < 1 {
                continue;
            }
            outcome.scanned += 1;
            if let Err(e) = self.dispatch_payment(payment, now, &mut outcome).await {
                outcome.failures += 1;
                error!(error = %e, "stage dispatch failed for payment");
            }
        }
        Ok(outcome)
    }

    async fn dispatch_payment(
        &self,
        payment: Payment,
        now: DateTime<Utc>,
        outcome: &mut DispatchOutcome,
    ) -> Result<()> {
        match OverdueStage::for_days(payment.overdue_days) {
            OverdueStage::Normal => Ok(()),
            OverdueStage::Warning => {
                if self.send_reminder(payment, now).await? {
                    outcome.reminders += 1;
                }
                Ok(())
            }
            OverdueStage::Overdue => {
                if self
                    .escalate(payment, OverdueStage::Overdue, "service_restricted", now)
                    .await?
                {
                    outcome.restrictions += 1;
                }
                Ok(())
            }
            OverdueStage::Collection => {
                if self
                    .escalate(payment, OverdueStage::Collection, "collection_started", now)
                    .await?
                {
                    outcome.collections += 1;
                }
                Ok(())
            }
            OverdueStage::Legal => {
                if self
                    .escalate(payment, OverdueStage::Legal, "legal_action_started", now)
                    .await?
                {
                    outcome.legal_actions += 1;
                }
                Ok(())
            }
        }
    }

    /// Sends one overdue reminder, unless one already went out within the
    /// cooldown window.
    async fn send_reminder(&self, payment: Payment, now: DateTime<Utc>) -> Result<bool> {
        let cooldown = Duration::hours(self.config.reminder_cooldown_hours);
        if let Some(last) = payment.last_reminder_sent_at
            && now - last < cooldown
        {
            return Ok(false);
        }

        let message = format!(
            "Payment of {} is {} days overdue (late interest {}). Please settle it promptly.",
            payment.amount, payment.overdue_days, payment.late_interest
        );
        self.notifications.send(payment.id, &message).await;

        let mut updated = payment.clone();
        updated.reminder_sent_count += 1;
        updated.last_reminder_sent_at = Some(now);
        self.payments.update(updated.clone()).await?;
        self.audit
            .record(
                "payment",
                updated.id,
                "reminder_sent",
                "scheduler",
                Some(&payment),
                &updated,
                None,
            )
            .await?;
        Ok(true)
    }

    /// One-shot escalation gated by the stage high-water mark: a payment
    /// already escalated to `target` or beyond is left untouched.
    async fn escalate(
        &self,
        payment: Payment,
        target: OverdueStage,
        action: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if payment.escalated_stage >= target {
            return Ok(false);
        }

        let mut updated = payment.clone();
        updated.escalated_stage = target;
        updated.advance_stage(target, now);
        self.payments.update(updated.clone()).await?;
        self.audit
            .record("payment", updated.id, action, "scheduler", Some(&payment), &updated, None)
            .await?;
        info!(payment_id = %updated.id, stage = %target, "payment escalated");
        Ok(true)
    }

    /// Starts the two background loops; the hourly recompute on a fixed
    /// interval, the stage dispatch once per day at the configured UTC hour.
    /// Task bodies log failures and never terminate the host process.
    pub fn start(self: Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let recompute = {
            let escalator = self.clone();
            tokio::spawn(async move {
                let mut ticker = interval(std::time::Duration::from_secs(
                    escalator.config.recompute_interval_secs,
                ));
                loop {
                    ticker.tick().await;
                    if let Err(e) = escalator.run_overdue_recompute(Utc::now()).await {
                        error!(error = %e, "overdue recompute pass errored");
                    }
                }
            })
        };

        let dispatch = {
            let escalator = self.clone();
            tokio::spawn(async move {
                loop {
                    let now = Utc::now();
                    let next = next_daily_execution(now, escalator.config.dispatch_hour);
                    let wait = (next - now).num_seconds().max(0) as u64;
                    info!(next = %next, "next stage dispatch scheduled");
                    tokio::time::sleep(std::time::Duration::from_secs(wait)).await;

                    if let Err(e) = escalator.run_stage_dispatch(Utc::now()).await {
                        error!(error = %e, "stage dispatch pass errored");
                    }
                }
            })
        };

        (recompute, dispatch)
    }
}

/// Next occurrence of `execution_hour` UTC strictly after `now`.
/// Out-of-range hours are clamped to 23.
pub fn next_daily_execution(now: DateTime<Utc>, execution_hour: u32) -> DateTime<Utc> {
    let today = now
        .date_naive()
        .and_hms_opt(execution_hour.min(23), 0, 0)
        .expect("hour clamped to 0-23");
    let today = Utc.from_utc_datetime(&today);

    if today <= now {
        today + Duration::days(1)
    } else {
        today
    }
}
