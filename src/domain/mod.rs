pub mod audit;
pub mod deduction;
pub mod money;
pub mod order;
pub mod payment;
pub mod payout;
pub mod ports;
pub mod settlement;
