use crate::domain::payment::Payment;
use crate::domain::settlement::Settlement;
use crate::error::Result;
use std::io::Write;

/// Writes settlement and payment state as CSV for the CLI.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(target),
        }
    }

    pub fn write_settlements(&mut self, settlements: &[Settlement]) -> Result<()> {
        self.writer.write_record([
            "settlement_id",
            "order_id",
            "helper_id",
            "status",
            "amount",
            "deductions",
            "net_amount",
        ])?;
        for s in settlements {
            self.writer.write_record([
                s.id.to_string(),
                s.order_id.to_string(),
                s.helper_id.to_string(),
                s.status.to_string(),
                s.amount.to_string(),
                s.deductions.to_string(),
                s.net_amount.to_string(),
            ])?;
        }
        Ok(())
    }

    pub fn write_payments(&mut self, payments: &[Payment]) -> Result<()> {
        self.writer.write_record([
            "payment_id",
            "order_id",
            "status",
            "overdue_days",
            "overdue_stage",
            "late_interest",
            "reminders_sent",
        ])?;
        for p in payments {
            self.writer.write_record([
                p.id.to_string(),
                p.order_id.to_string(),
                p.status.to_string(),
                p.overdue_days.to_string(),
                p.overdue_stage.to_string(),
                p.late_interest.to_string(),
                p.reminder_sent_count.to_string(),
            ])?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
