//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Splitting R$ 10.00 across three sales:                                 │
//! │    1000 cents / 3 = 333 cents (×3 = 999 cents)                          │
//! │    We KNOW we lost 1 cent, and the allocator puts it back explicitly    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Round2
//! Every value is already a whole number of cents, so "round to 2 decimals"
//! only happens at the two places where a finer value can appear:
//! - [`Money::parse_decimal`] - textual input such as `"12.345"`
//! - [`Money::mul_ratio`] - proportional shares (`value × num / den`)
//!
//! Both round half-up (away from zero).
//!
//! ## Usage
//! ```rust
//! use fomezero_core::money::Money;
//!
//! let price = Money::from_cents(1099); // R$ 10.99
//! let doubled = price * 2;             // R$ 21.98
//! let parsed = Money::parse_decimal("10.995").unwrap();
//! assert_eq!(parsed.cents(), 1100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Tolerance used by every "equal within a cent" comparison.
pub const PAYMENT_TOLERANCE: Money = Money::from_cents(1);

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for residuals and signed deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent sqlx type**: Stored as INTEGER `*_cents` columns
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use fomezero_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole reais and centavos.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -R$ 5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal string and rounds it to two places (half-up).
    ///
    /// Accepts an optional sign, `.` or `,` as the decimal separator and any
    /// number of fractional digits.
    ///
    /// ```rust
    /// use fomezero_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("12.34").unwrap().cents(), 1234);
    /// assert_eq!(Money::parse_decimal("0,005").unwrap().cents(), 1);
    /// assert_eq!(Money::parse_decimal("-1.005").unwrap().cents(), -101);
    /// assert!(Money::parse_decimal("12.3.4").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("'{}' is not a decimal amount", input),
        };

        let trimmed = input.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let mut parts = unsigned.splitn(2, ['.', ',']);
        let whole = parts.next().unwrap_or("");
        let fraction = parts.next().unwrap_or("");

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let digits: Vec<u32> = fraction.chars().filter_map(|c| c.to_digit(10)).collect();
        let first = i64::from(digits.first().copied().unwrap_or(0));
        let second = i64::from(digits.get(1).copied().unwrap_or(0));
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);

        let cents = whole_value
            .checked_mul(100)
            .and_then(|c| c.checked_add(first * 10 + second + i64::from(round_up)))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `self` floored at zero.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// Only for values already known to fit; unchecked input goes through
    /// [`Money::checked_multiply_quantity`].
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `self × qty`, or `None` when the product leaves the `i64` cent range.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self + other`, or `None` on overflow.
    ///
    /// ```rust
    /// use fomezero_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1).checked_add(Money::from_cents(2)), Some(Money::from_cents(3)));
    /// assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());
    /// ```
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Computes `self × numerator / denominator`, rounded half-up to the cent.
    ///
    /// This is the Round2 used by proportional allocation. A zero or negative
    /// denominator has no meaningful share and yields zero.
    ///
    /// ```rust
    /// use fomezero_core::money::Money;
    ///
    /// // R$ 10.00 × 1/3 = 3.333… → R$ 3.33
    /// assert_eq!(Money::from_cents(1000).mul_ratio(1, 3).cents(), 333);
    /// // R$ 10.00 × 2/3 = 6.666… → R$ 6.67
    /// assert_eq!(Money::from_cents(1000).mul_ratio(2, 3).cents(), 667);
    /// ```
    pub fn mul_ratio(&self, numerator: i64, denominator: i64) -> Money {
        if denominator <= 0 {
            return Money::zero();
        }
        let product = i128::from(self.0) * i128::from(numerator);
        Money(div_round_half_up(product, i128::from(denominator)) as i64)
    }

    /// True when the two values differ by at most [`PAYMENT_TOLERANCE`].
    #[inline]
    pub fn approx_eq(&self, other: Money) -> bool {
        (self.0 - other.0).abs() <= PAYMENT_TOLERANCE.0
    }
}

/// Integer division rounding half away from zero. `d` must be positive.
fn div_round_half_up(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `R$ 10.99`.
///
/// ## Note
/// The admin SPA does its own locale formatting; this is for messages and logs.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R$ {}.{:02}", sign, self.reais().abs(), self.cents_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A signed percentage with two decimal places, stored in hundredths.
///
/// `Percent::from_hundredths(5000)` is 50.00%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(i64);

impl Percent {
    pub const HUNDRED: Percent = Percent(10_000);

    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Percent(hundredths)
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Signed growth from `previous` to `current`.
    ///
    /// ## Rules
    /// - previous > 0: `(current - previous) / previous × 100`, half-up
    /// - previous == 0 and current > 0: +100%
    /// - otherwise: 0%
    ///
    /// ```rust
    /// use fomezero_core::money::{Money, Percent};
    ///
    /// let growth = Percent::change(Money::from_cents(15000), Money::from_cents(10000));
    /// assert_eq!(growth.hundredths(), 5000); // +50.00%
    /// ```
    pub fn change(current: Money, previous: Money) -> Percent {
        if previous.is_positive() {
            let delta = i128::from(current.cents() - previous.cents()) * 10_000;
            Percent(div_round_half_up(delta, i128::from(previous.cents())) as i64)
        } else if current.is_positive() {
            Percent::HUNDRED
        } else {
            Percent::zero()
        }
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}%", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.reais(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10.99");
        assert_eq!(Money::from_cents(500).to_string(), "R$ 5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5.50");
        assert_eq!(Money::zero().to_string(), "R$ 0.00");
    }

    #[test]
    fn test_parse_decimal_rounds_half_up() {
        assert_eq!(Money::parse_decimal("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse_decimal("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse_decimal("10.994").unwrap().cents(), 1099);
        assert_eq!(Money::parse_decimal("10.995").unwrap().cents(), 1100);
        assert_eq!(Money::parse_decimal(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal("3,33").unwrap().cents(), 333);
        assert_eq!(Money::parse_decimal(" 7.00 ").unwrap().cents(), 700);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1.2.3").is_err());
        assert!(Money::parse_decimal("1e5").is_err());
        assert!(Money::parse_decimal("-").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_mul_ratio() {
        let ten = Money::from_cents(1000);
        assert_eq!(ten.mul_ratio(1, 3).cents(), 333);
        assert_eq!(ten.mul_ratio(2, 3).cents(), 667);
        assert_eq!(ten.mul_ratio(1, 8).cents(), 125);
        assert_eq!(Money::from_cents(5).mul_ratio(1, 2).cents(), 3);
        assert_eq!(Money::from_cents(-5).mul_ratio(1, 2).cents(), -3);
        assert_eq!(ten.mul_ratio(1, 0), Money::zero());
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let a = Money::from_cents(1000);
        assert!(a.approx_eq(Money::from_cents(1001)));
        assert!(a.approx_eq(Money::from_cents(999)));
        assert!(!a.approx_eq(Money::from_cents(1002)));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_cents(-3).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(3).non_negative().cents(), 3);
    }

    #[test]
    fn test_percent_change() {
        let change = Percent::change(Money::from_cents(15000), Money::from_cents(10000));
        assert_eq!(change.hundredths(), 5000);

        let drop = Percent::change(Money::from_cents(7500), Money::from_cents(10000));
        assert_eq!(drop.hundredths(), -2500);

        let third = Percent::change(Money::from_cents(4000), Money::from_cents(3000));
        assert_eq!(third.hundredths(), 3333);

        assert_eq!(
            Percent::change(Money::from_cents(100), Money::zero()),
            Percent::HUNDRED
        );
        assert_eq!(Percent::change(Money::zero(), Money::zero()), Percent::zero());
    }

    #[test]
    fn test_percent_display() {
        assert_eq!(Percent::from_hundredths(5000).to_string(), "50.00%");
        assert_eq!(Percent::from_hundredths(-2505).to_string(), "-25.05%");
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(1234)).unwrap();
        assert_eq!(json, "1234");
    }
}
