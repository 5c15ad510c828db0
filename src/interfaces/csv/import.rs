use crate::domain::deduction::DeductionKind;
use crate::domain::order::Order;
use crate::error::{Result, SettlementError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Reads completed-order views from a CSV source.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<Order>`,
/// allowing large files to be processed in a streaming fashion. Whitespace
/// is trimmed and record lengths are flexible.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: csv_reader(source),
        }
    }

    pub fn orders(self) -> impl Iterator<Item = Result<Order>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(SettlementError::from))
    }
}

/// One deduction row as imported from CSV; linked to its settlement later.
#[derive(Debug, Clone, Deserialize)]
pub struct DeductionRecord {
    pub order_id: Uuid,
    pub helper_id: Uuid,
    pub kind: DeductionKind,
    pub amount: Decimal,
    pub reason: String,
}

pub struct DeductionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> DeductionReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: csv_reader(source),
        }
    }

    pub fn deductions(self) -> impl Iterator<Item = Result<DeductionRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(SettlementError::from))
    }
}

/// One requester payment row as imported from CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRecord {
    pub order_id: Uuid,
    pub requester_id: Uuid,
    pub amount: Decimal,
    pub due_date: Option<DateTime<Utc>>,
}

pub struct PaymentReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PaymentReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: csv_reader(source),
        }
    }

    pub fn payments(self) -> impl Iterator<Item = Result<PaymentRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(SettlementError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::order::OrderStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_reader_valid_stream() {
        let data = "id, total_price, completed_at, helper_id, requester_id, status\n\
            11111111-1111-1111-1111-111111111111, 100000, 2026-08-01T10:00:00Z, \
            22222222-2222-2222-2222-222222222222, 33333333-3333-3333-3333-333333333333, completed";
        let reader = OrderReader::new(data.as_bytes());
        let orders: Vec<Result<Order>> = reader.orders().collect();

        assert_eq!(orders.len(), 1);
        let order = orders[0].as_ref().unwrap();
        assert_eq!(order.total_price, Money::new(dec!(100000)));
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());
    }

    #[test]
    fn test_order_reader_malformed_line() {
        let data = "id, total_price, completed_at, helper_id, requester_id, status\n\
            not-a-uuid, 100000, , x, y, completed";
        let reader = OrderReader::new(data.as_bytes());
        let orders: Vec<Result<Order>> = reader.orders().collect();
        assert!(orders[0].is_err());
    }

    #[test]
    fn test_payment_reader_optional_due_date() {
        let data = "order_id, requester_id, amount, due_date\n\
            11111111-1111-1111-1111-111111111111, 33333333-3333-3333-3333-333333333333, 50000, ";
        let reader = PaymentReader::new(data.as_bytes());
        let payments: Vec<Result<PaymentRecord>> = reader.payments().collect();

        let record = payments[0].as_ref().unwrap();
        assert_eq!(record.amount, dec!(50000));
        assert!(record.due_date.is_none());
    }

    #[test]
    fn test_deduction_reader_kind_parsing() {
        let data = "order_id, helper_id, kind, amount, reason\n\
            11111111-1111-1111-1111-111111111111, 22222222-2222-2222-2222-222222222222, \
            missing_items, 5000, two parcels short";
        let reader = DeductionReader::new(data.as_bytes());
        let records: Vec<Result<DeductionRecord>> = reader.deductions().collect();

        let record = records[0].as_ref().unwrap();
        assert_eq!(record.kind, DeductionKind::MissingItems);
        assert_eq!(record.amount, dec!(5000));
    }
}
