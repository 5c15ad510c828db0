//! Application layer orchestrating the settlement and collections domain.
//!
//! Services own shared handles to the store ports and implement the state
//! machines: settlement lifecycle, deduction ledger, payout processing and
//! the overdue escalation scheduler.

pub mod audit;
pub mod calculator;
pub mod deductions;
pub mod escalation;
pub mod payouts;
pub mod reports;
pub mod settlements;
pub mod webhook;
