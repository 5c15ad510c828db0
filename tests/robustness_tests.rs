mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{ORDER_ID, ORDER_ID_2};
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

#[test]
fn test_malformed_order_rows_are_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "id, total_price, completed_at, helper_id, requester_id, status"
    )
    .unwrap();
    writeln!(
        file,
        "{ORDER_ID}, 100000, 2026-08-01T10:00:00Z, {}, {}, completed",
        common::HELPER_ID,
        common::REQUESTER_ID
    )
    .unwrap();
    writeln!(file, "not-a-uuid, 100000, , x, y, completed").unwrap();
    writeln!(
        file,
        "{ORDER_ID_2}, 50000, 2026-08-02T10:00:00Z, {}, {}, completed",
        common::HELPER_ID,
        common::REQUESTER_ID
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(file.path());

    // Both valid orders settle; the bad row only produces a stderr line.
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading order"))
        .stdout(predicate::str::contains("pending,100000,0,100000"))
        .stdout(predicate::str::contains("pending,50000,0,50000"));
}

#[test]
fn test_duplicate_order_settles_once() {
    let orders = common::orders_csv(&[(ORDER_ID, "100000"), (ORDER_ID, "100000")]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error generating settlement"))
        .stdout(predicate::str::contains("pending,100000,0,100000").count(1));
}

#[test]
fn test_cancelled_order_not_settled() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "id, total_price, completed_at, helper_id, requester_id, status"
    )
    .unwrap();
    writeln!(
        file,
        "{ORDER_ID}, 100000, , {}, {}, cancelled",
        common::HELPER_ID,
        common::REQUESTER_ID
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error generating settlement"))
        .stdout(predicate::str::contains("pending").not());
}

#[test]
fn test_non_positive_deduction_rejected() {
    let orders = common::orders_csv(&[(ORDER_ID, "100000")]);
    let deductions = common::deductions_csv(&[(ORDER_ID, "penalty", "-500")]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path())
        .arg("--deductions")
        .arg(deductions.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error applying deduction"))
        .stdout(predicate::str::contains("pending,100000,0,100000"));
}

#[test]
fn test_deduction_for_unsettled_order_is_informational() {
    let orders = common::orders_csv(&[(ORDER_ID, "100000")]);
    // No settlement exists for this order id, so the deduction stays unlinked.
    let deductions = common::deductions_csv(&[(ORDER_ID_2, "damage", "700")]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path())
        .arg("--deductions")
        .arg(deductions.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pending,100000,0,100000"));
}

#[test]
fn test_missing_orders_file_fails() {
    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg("does-not-exist.csv");

    cmd.assert().failure();
}
