//! Type-safe money representation in integer cents.
//!
//! Every amount that crosses the wire (tax preview, payment intent, order
//! history) is an integer number of cents. Decimal arithmetic is only used at
//! the edges: formatting for display and converting legacy dollar amounts.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// An amount of money in the smallest currency unit (cents for USD).
///
/// ```
/// use seattle_trading_core::Cents;
///
/// let total = Cents::new(2000) + Cents::new(200);
/// assert_eq!(total.to_string(), "$22.00");
/// assert_eq!(Cents::new(123_456_789).to_string(), "$1,234,567.89");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a number of cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Get the raw number of cents.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Clamp negative amounts to zero.
    #[must_use]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 { Self::ZERO } else { self }
    }

    /// Convert a dollar amount to cents, rounding half away from zero.
    ///
    /// Returns `None` if the amount does not fit in an `i64` of cents.
    #[must_use]
    pub fn from_dollars(dollars: Decimal) -> Option<Self> {
        (dollars * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// The amount in dollars.
    #[must_use]
    pub fn to_dollars(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Multiply by a line quantity, saturating on overflow.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }
}

impl fmt::Display for Cents {
    /// Formats as en-US currency, e.g. `$1,234.56` or `-$0.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.to_dollars().abs();
        let plain = format!("{dollars:.2}");
        let (whole, frac) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${grouped}.{frac}")
    }
}

impl From<i64> for Cents {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl From<Cents> for i64 {
    fn from(cents: Cents) -> Self {
        cents.0
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Cents {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// ISO 4217 currency codes.
///
/// The storefront only sells in USD; the code is carried on persisted
/// snapshots so older data stays self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    Usd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Cents::new(0).to_string(), "$0.00");
        assert_eq!(Cents::new(5).to_string(), "$0.05");
        assert_eq!(Cents::new(14_999).to_string(), "$149.99");
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Cents::new(100_000).to_string(), "$1,000.00");
        assert_eq!(Cents::new(99_999_999).to_string(), "$999,999.99");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Cents::new(-50).to_string(), "-$0.50");
        assert_eq!(Cents::new(-123_456).to_string(), "-$1,234.56");
    }

    #[test]
    fn test_from_dollars_rounds() {
        assert_eq!(
            Cents::from_dollars(Decimal::new(14_999, 2)),
            Some(Cents::new(14_999))
        );
        assert_eq!(
            Cents::from_dollars(Decimal::new(10_005, 3)),
            Some(Cents::new(1001))
        );
    }

    #[test]
    fn test_arithmetic() {
        let line = Cents::new(1000) * 2;
        assert_eq!(line, Cents::new(2000));
        let sum: Cents = [Cents::new(1), Cents::new(2), Cents::new(3)]
            .into_iter()
            .sum();
        assert_eq!(sum, Cents::new(6));
        assert_eq!((Cents::new(450) - Cents::new(500)).non_negative(), Cents::ZERO);
    }

    #[test]
    fn test_currency_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CurrencyCode::Usd).unwrap_or_default(),
            "\"usd\""
        );
    }
}
