use crate::error::SettlementError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Represents a monetary balance with 2 decimal places precision.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for financial calculations. Unlike [`Amount`], a `Money`
/// value may be zero or (transiently) negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Money(pub Decimal);

/// Represents a positive monetary amount for deductions and payouts.
///
/// Ensures that input amounts are always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, SettlementError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(SettlementError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = SettlementError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Money {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Scales the value by a decimal factor (e.g. a fee rate).
    pub fn times(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }

    /// Floors the value at zero.
    pub fn max_zero(&self) -> Self {
        if self.is_negative() { Self::ZERO } else { *self }
    }

    /// Rounds to 2 decimal places.
    pub fn rounded(&self) -> Self {
        Self(self.0.round_dp(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Implement basic arithmetic for Money to make it a usable Value Object
impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(10.0));
        let b = Money::new(dec!(5.0));
        assert_eq!(a + b, Money::new(dec!(15.0)));
        assert_eq!(a - b, Money::new(dec!(5.0)));
    }

    #[test]
    fn test_money_times_and_rounding() {
        let fee = Money::new(dec!(100000)).times(dec!(0.10));
        assert_eq!(fee, Money::new(dec!(10000.0)));

        let interest = Money::new(dec!(1000000))
            .times(dec!(0.15) / dec!(365) * dec!(10))
            .rounded();
        assert_eq!(interest, Money::new(dec!(4109.59)));
    }

    #[test]
    fn test_money_max_zero() {
        assert_eq!(Money::new(dec!(-3.0)).max_zero(), Money::ZERO);
        assert_eq!(Money::new(dec!(3.0)).max_zero(), Money::new(dec!(3.0)));
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(SettlementError::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(SettlementError::Validation(_))
        ));
    }
}
