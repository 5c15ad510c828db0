mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{ORDER_ID, ORDER_ID_2};
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_settlement_generated_pending() {
    let orders = common::orders_csv(&[(ORDER_ID, "100000")]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path());

    // amount = order total, no deductions yet, net == amount.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "settlement_id,order_id,helper_id,status,amount,deductions,net_amount",
        ))
        .stdout(predicate::str::contains(format!(
            "{ORDER_ID},{},pending,100000,0,100000",
            common::HELPER_ID
        )));
}

#[test]
fn test_deduction_reduces_net_amount() {
    let orders = common::orders_csv(&[(ORDER_ID, "100000")]);
    let deductions = common::deductions_csv(&[(ORDER_ID, "damage", "10000")]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path())
        .arg("--deductions")
        .arg(deductions.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pending,100000,10000,90000"));
}

#[test]
fn test_confirm_flag_confirms_all() {
    let orders = common::orders_csv(&[(ORDER_ID, "100000"), (ORDER_ID_2, "50000")]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path()).arg("--confirm");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("confirmed,100000,0,100000"))
        .stdout(predicate::str::contains("confirmed,50000,0,50000"));
}

#[test]
fn test_full_flow_order_to_paid() {
    // 100,000 order, 10,000 deduction applied, confirmed, payout
    // succeeds, settlement ends paid with net 90,000.
    let orders = common::orders_csv(&[(ORDER_ID, "100000")]);
    let deductions = common::deductions_csv(&[(ORDER_ID, "damage", "10000")]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path())
        .arg("--deductions")
        .arg(deductions.path())
        .arg("--pay");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("paid,100000,10000,90000"));
}

#[test]
fn test_multiple_deductions_accumulate() {
    let orders = common::orders_csv(&[(ORDER_ID, "100000")]);
    let deductions = common::deductions_csv(&[
        (ORDER_ID, "damage", "3000"),
        (ORDER_ID, "penalty", "2000"),
        (ORDER_ID, "missing_items", "1500"),
    ]);

    let mut cmd = Command::new(cargo_bin!("courierpay"));
    cmd.arg(orders.path())
        .arg("--deductions")
        .arg(deductions.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pending,100000,6500,93500"));
}
