#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

pub const ORDER_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const HELPER_ID: &str = "22222222-2222-2222-2222-222222222222";
pub const REQUESTER_ID: &str = "33333333-3333-3333-3333-333333333333";
pub const ORDER_ID_2: &str = "44444444-4444-4444-4444-444444444444";

/// Writes an orders CSV with one row per (order_id, total_price) pair.
/// All rows share the fixture helper and requester.
pub fn orders_csv(rows: &[(&str, &str)]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "id, total_price, completed_at, helper_id, requester_id, status"
    )
    .unwrap();
    for (order_id, total) in rows {
        writeln!(
            file,
            "{order_id}, {total}, 2026-08-01T10:00:00Z, {HELPER_ID}, {REQUESTER_ID}, completed"
        )
        .unwrap();
    }
    file
}

/// Writes a deductions CSV with one row per (order_id, kind, amount) triple.
pub fn deductions_csv(rows: &[(&str, &str, &str)]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "order_id, helper_id, kind, amount, reason").unwrap();
    for (order_id, kind, amount) in rows {
        writeln!(file, "{order_id}, {HELPER_ID}, {kind}, {amount}, fixture").unwrap();
    }
    file
}

/// Writes a payments CSV with one row per (order_id, amount, due_date) triple.
/// Pass an empty due_date for payments without one.
pub fn payments_csv(rows: &[(&str, &str, &str)]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "order_id, requester_id, amount, due_date").unwrap();
    for (order_id, amount, due_date) in rows {
        writeln!(file, "{order_id}, {REQUESTER_ID}, {amount}, {due_date}").unwrap();
    }
    file
}
