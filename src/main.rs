use chrono::{DateTime, Utc};
use clap::Parser;
use courierpay::application::audit::AuditRecorder;
use courierpay::application::calculator::{CalculatorConfig, SettlementCalculator};
use courierpay::application::deductions::DeductionService;
use courierpay::application::escalation::{EscalatorConfig, OverdueEscalator};
use courierpay::application::payouts::PayoutService;
use courierpay::application::settlements::SettlementService;
use courierpay::domain::deduction::NewDeduction;
use courierpay::domain::money::Money;
use courierpay::domain::payment::Payment;
use courierpay::domain::payout::PayoutStatus;
use courierpay::domain::ports::PaymentStore;
use courierpay::domain::settlement::Settlement;
use courierpay::infrastructure::in_memory::{
    InMemoryAuditLogStore, InMemoryDeductionStore, InMemoryOrderStore, InMemoryPaymentStore,
    InMemoryPayoutStore, InMemorySettlementStore, RecordingNotificationSink,
    RecordingPayoutGateway,
};
use courierpay::interfaces::csv::import::{DeductionReader, OrderReader, PaymentReader};
use courierpay::interfaces::csv::report_writer::ReportWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Completed orders CSV file
    orders: PathBuf,

    /// Deductions CSV, created and applied against the generated settlements
    #[arg(long)]
    deductions: Option<PathBuf>,

    /// Requester payments CSV, run through one escalation cycle
    #[arg(long)]
    payments: Option<PathBuf>,

    /// Clock used for the escalation cycle (RFC 3339); defaults to now
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,

    /// Confirm every generated settlement
    #[arg(long)]
    confirm: bool,

    /// Create, send and complete a payout per settlement (implies --confirm)
    #[arg(long)]
    pay: bool,
}

const ACTOR: &str = "cli";

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let order_store = InMemoryOrderStore::new();
    let settlement_store = InMemorySettlementStore::new();
    let deduction_store = InMemoryDeductionStore::new();
    let payout_store = InMemoryPayoutStore::new();
    let payment_store = InMemoryPaymentStore::new();

    let audit = AuditRecorder::new(Arc::new(InMemoryAuditLogStore::new()));
    let settlements = Arc::new(SettlementService::new(
        Arc::new(settlement_store.clone()),
        audit.clone(),
    ));
    let calculator = SettlementCalculator::new(
        Arc::new(order_store.clone()),
        Arc::new(deduction_store.clone()),
        Arc::new(settlement_store.clone()),
        audit.clone(),
        CalculatorConfig::default(),
    );
    let deductions = DeductionService::new(
        Arc::new(deduction_store.clone()),
        settlements.clone(),
        audit.clone(),
    );
    let payouts = PayoutService::new(
        Arc::new(payout_store),
        settlements.clone(),
        Arc::new(RecordingPayoutGateway::new()),
        audit.clone(),
    );
    let escalator = OverdueEscalator::new(
        Arc::new(payment_store.clone()),
        Arc::new(RecordingNotificationSink::new()),
        audit,
        EscalatorConfig::default(),
    );

    // Import orders and generate one pending settlement per completed order.
    let mut generated: Vec<Settlement> = Vec::new();
    let file = File::open(&cli.orders).into_diagnostic()?;
    for order_result in OrderReader::new(file).orders() {
        match order_result {
            Ok(order) => {
                let order_id = order.id;
                order_store.put(order).await;
                match calculator.generate_for_order(order_id, ACTOR).await {
                    Ok(settlement) => generated.push(settlement),
                    Err(e) => eprintln!("Error generating settlement: {e}"),
                }
            }
            Err(e) => eprintln!("Error reading order: {e}"),
        }
    }

    // Create, link and apply deductions.
    if let Some(path) = &cli.deductions {
        let file = File::open(path).into_diagnostic()?;
        for record_result in DeductionReader::new(file).deductions() {
            let record = match record_result {
                Ok(record) => record,
                Err(e) => {
                    eprintln!("Error reading deduction: {e}");
                    continue;
                }
            };
            let settlement_id = generated
                .iter()
                .find(|s| s.order_id == record.order_id)
                .map(|s| s.id);
            let data = NewDeduction {
                settlement_id,
                order_id: Some(record.order_id),
                helper_id: record.helper_id,
                kind: record.kind,
                amount: Money::new(record.amount),
                reason: record.reason,
            };
            let applied = async {
                let deduction = deductions.create(data, ACTOR).await?;
                deductions.apply(deduction.id, ACTOR).await
            }
            .await;
            if let Err(e) = applied {
                eprintln!("Error applying deduction: {e}");
            }
        }
    }

    if cli.confirm || cli.pay {
        for settlement in &generated {
            if let Err(e) = settlements.confirm(settlement.id, ACTOR).await {
                eprintln!("Error confirming settlement: {e}");
            }
        }
    }

    if cli.pay {
        for settlement in &generated {
            let paid = async {
                let payout = payouts
                    .create(settlement.id, "bank_transfer", "on-file", ACTOR)
                    .await?;
                payouts
                    .update_status(payout.id, PayoutStatus::Sent, ACTOR, None)
                    .await?;
                payouts
                    .update_status(payout.id, PayoutStatus::Succeeded, ACTOR, None)
                    .await
            }
            .await;
            if let Err(e) = paid {
                eprintln!("Error paying settlement: {e}");
            }
        }
    }

    // Import requester payments and run one escalation cycle against them.
    let mut payment_ids: Vec<Uuid> = Vec::new();
    if let Some(path) = &cli.payments {
        let file = File::open(path).into_diagnostic()?;
        for record_result in PaymentReader::new(file).payments() {
            match record_result {
                Ok(record) => {
                    let payment = Payment::new(
                        record.order_id,
                        record.requester_id,
                        Money::new(record.amount),
                        record.due_date,
                        Utc::now(),
                    );
                    payment_ids.push(payment.id);
                    if let Err(e) = payment_store.insert(payment).await {
                        eprintln!("Error storing payment: {e}");
                    }
                }
                Err(e) => eprintln!("Error reading payment: {e}"),
            }
        }

        let as_of = cli.as_of.unwrap_or_else(Utc::now);
        escalator
            .run_overdue_recompute(as_of)
            .await
            .into_diagnostic()?;
        escalator.run_stage_dispatch(as_of).await.into_diagnostic()?;
    }

    // Output final state.
    let mut final_settlements: Vec<Settlement> = Vec::with_capacity(generated.len());
    for settlement in &generated {
        final_settlements.push(settlements.get(settlement.id).await.into_diagnostic()?);
    }

    let mut final_payments: Vec<Payment> = Vec::with_capacity(payment_ids.len());
    for id in &payment_ids {
        if let Some(payment) = payment_store.get(*id).await.into_diagnostic()? {
            final_payments.push(payment);
        }
    }

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_settlements(&final_settlements).into_diagnostic()?;
    if !final_payments.is_empty() {
        writer.write_payments(&final_payments).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}
