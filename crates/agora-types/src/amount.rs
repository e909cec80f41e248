//! Amount type for Agora
//!
//! Agora is single-asset: every price and balance is a `u64` of base units.
//! All arithmetic is checked, and the auction interpolation is done in
//! `u128` so `price * elapsed` cannot overflow mid-calculation.

use crate::{AgoraError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// A non-negative amount of the market's settlement asset, in base units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(pub u64);

impl Amount {
    /// Create an amount from base units
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The zero amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(AgoraError::AmountOverflow)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(AgoraError::AmountUnderflow)
    }

    /// Compute `self + (other - self) * numerator / denominator`, truncating
    /// toward zero.
    ///
    /// This is the auction interpolation: `other >= self` must hold and
    /// `denominator` must be non-zero. The intermediate product is carried in
    /// u128, so no overflow is possible for any u64 inputs.
    pub fn lerp(self, other: Self, numerator: u64, denominator: u64) -> Result<Self> {
        if denominator == 0 {
            return Err(AgoraError::DivisionByZero);
        }
        let span = other.checked_sub(self)?;
        let scaled = (span.0 as u128) * (numerator as u128) / (denominator as u128);
        // span * num / den <= span for num <= den, so the cast cannot truncate
        self.checked_add(Self(scaled as u64))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| {
            Amount(acc.0.saturating_add(a.0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(100);
        let b = Amount::new(40);

        assert_eq!(a.checked_add(b).unwrap(), Amount::new(140));
        assert_eq!(a.checked_sub(b).unwrap(), Amount::new(60));
        assert!(b.checked_sub(a).is_err());
        assert!(Amount::new(u64::MAX).checked_add(Amount::new(1)).is_err());
    }

    #[test]
    fn test_lerp_endpoints() {
        let min = Amount::new(100);
        let max = Amount::new(200);

        assert_eq!(min.lerp(max, 0, 60).unwrap(), min);
        assert_eq!(min.lerp(max, 60, 60).unwrap(), max);
        assert_eq!(min.lerp(max, 30, 60).unwrap(), Amount::new(150));
    }

    #[test]
    fn test_lerp_truncates_toward_zero() {
        // 0 + 10 * 1 / 3 = 3.33.. -> 3
        assert_eq!(
            Amount::zero().lerp(Amount::new(10), 1, 3).unwrap(),
            Amount::new(3)
        );
    }

    #[test]
    fn test_lerp_no_overflow_at_extremes() {
        let min = Amount::zero();
        let max = Amount::new(u64::MAX);
        assert_eq!(min.lerp(max, u64::MAX, u64::MAX).unwrap(), max);
    }

    #[test]
    fn test_lerp_zero_denominator() {
        assert!(matches!(
            Amount::zero().lerp(Amount::new(10), 1, 0),
            Err(AgoraError::DivisionByZero)
        ));
    }
}
