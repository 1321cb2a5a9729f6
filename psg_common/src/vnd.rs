use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const VND_CURRENCY_CODE: &str = "VND";
pub const VND_CURRENCY_CODE_LOWER: &str = "vnd";

/// The multiplier VNPay applies to amounts on the wire. The đồng has no minor unit, so the gateway
/// transmits `amount * 100` and every inbound amount must divide cleanly by it.
const GATEWAY_SCALE: i64 = 100;

//--------------------------------------        Vnd        -----------------------------------------------------------
/// An amount of Vietnamese đồng. The đồng has no decimal subdivision, so this is a whole number of
/// đồng. Conversion to and from the gateway's scaled wire representation goes through
/// [`Vnd::to_gateway_amount`] and [`Vnd::from_gateway_amount`] only.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Vnd(i64);

op!(binary Vnd, Add, add);
op!(binary Vnd, Sub, sub);
op!(inplace Vnd, SubAssign, sub_assign);
op!(unary Vnd, Neg, neg);

impl Mul<i64> for Vnd {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Vnd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in đồng: {0}")]
pub struct VndConversionError(String);

impl From<i64> for Vnd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Vnd {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Vnd {}

impl Display for Vnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}₫", self.0)
    }
}

impl Vnd {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// `None` if the product does not fit in an `i64` amount of đồng.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// `None` if the sum does not fit in an `i64` amount of đồng.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn saturating_mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// The amount as VNPay expects it in `vnp_Amount`: scaled by 100.
    pub fn to_gateway_amount(&self) -> i64 {
        self.0 * GATEWAY_SCALE
    }

    /// Converts a `vnp_Amount` value back into đồng. Amounts that are not a clean multiple of the
    /// gateway scale were not produced by [`Vnd::to_gateway_amount`] and are rejected.
    pub fn from_gateway_amount(amount: i64) -> Result<Self, VndConversionError> {
        if amount % GATEWAY_SCALE != 0 {
            return Err(VndConversionError(format!(
                "{amount} is not a multiple of the gateway scale ({GATEWAY_SCALE})"
            )));
        }
        Ok(Self(amount / GATEWAY_SCALE))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vnd::from(500_000);
        let b = Vnd::from(300_000);
        assert_eq!(a + b, Vnd::from(800_000));
        assert_eq!(a - b, Vnd::from(200_000));
        assert_eq!(b * 2, Vnd::from(600_000));
        let total: Vnd = [a, b * 2].into_iter().sum();
        assert_eq!(total, Vnd::from(1_100_000));
    }

    #[test]
    fn checked_arithmetic_flags_overflow() {
        let huge = Vnd::from(i64::MAX / 2);
        assert!(huge.checked_mul(3).is_none());
        assert!(huge.checked_add(huge).is_some());
        assert!(Vnd::from(i64::MAX).checked_add(Vnd::from(1)).is_none());
        assert_eq!(huge.saturating_mul(3), Vnd::from(i64::MAX));
        assert_eq!(Vnd::from(1000).checked_mul(2), Some(Vnd::from(2000)));
    }

    #[test]
    fn gateway_scaling_round_trips() {
        let amount = Vnd::from(1_100_000);
        assert_eq!(amount.to_gateway_amount(), 110_000_000);
        assert_eq!(Vnd::from_gateway_amount(110_000_000).unwrap(), amount);
    }

    #[test]
    fn gateway_scaling_rejects_fractional_dong() {
        assert!(Vnd::from_gateway_amount(110_000_050).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Vnd::from(1_100_000).to_string(), "1100000₫");
    }
}
