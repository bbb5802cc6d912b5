//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  An order of 3 × S/ 1.10 must total exactly S/ 3.30, every time.       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents (céntimos)                                 │
//! │    110 cents × 3 = 330 cents                                            │
//! │    Subtotals and order totals are exact sums of integers               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use masseria_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1000); // S/ 10.00
//!
//! // Or parse the decimal text a client submitted
//! let other = Money::parse("5.50").unwrap();
//!
//! let total = price * 2 + other;
//! assert_eq!(total.cents(), 2550);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Currency symbol used for display (Peruvian sol).
pub const CURRENCY_SYMBOL: &str = "S/";

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (céntimos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  Product.price_cents ──► LineItem.unit_price (snapshot)                │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │                          LineItem.subtotal = unit_price × quantity     │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │                          Order.total = Σ subtotal                      │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │                          Dashboard "sales today"                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use masseria_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (soles and céntimos).
    ///
    /// ## Example
    /// ```rust
    /// use masseria_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99);
    /// assert_eq!(price.cents(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50);
    /// assert_eq!(negative.cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal amount such as `"10"`, `"5.5"` or `"5.50"`.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At least one integer digit
    /// - At most two fractional digits (no rounding is ever applied)
    ///
    /// ## Example
    /// ```rust
    /// use masseria_core::money::Money;
    ///
    /// assert_eq!(Money::parse("5.50").unwrap().cents(), 550);
    /// assert_eq!(Money::parse("5.5").unwrap().cents(), 550);
    /// assert!(Money::parse("5.555").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let (negative, unsigned) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (major_text, minor_text) = match unsigned.split_once('.') {
            Some((major, minor)) => {
                if minor.is_empty() {
                    return Err(invalid("missing digits after decimal point"));
                }
                (major, minor)
            }
            None => (unsigned, ""),
        };

        if major_text.is_empty() || !major_text.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }
        if !minor_text.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }
        if minor_text.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let major: i64 = major_text
            .parse()
            .map_err(|_| invalid("amount is too large"))?;
        let minor: i64 = match minor_text.len() {
            0 => 0,
            1 => minor_text.parse::<i64>().map_err(|_| invalid("must be a decimal number"))? * 10,
            _ => minor_text.parse().map_err(|_| invalid("must be a decimal number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (soles) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (céntimos) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use masseria_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000);
    /// let subtotal = unit_price.multiply_quantity(2);
    /// assert_eq!(subtotal.cents(), 2000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation, e.g. `S/ 25.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{} {}.{:02}",
            sign,
            CURRENCY_SYMBOL,
            self.major().abs(),
            self.cents_part()
        )
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
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
        assert_eq!(money.major(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(2550)), "S/ 25.50");
        assert_eq!(format!("{}", Money::from_cents(500)), "S/ 5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-S/ 5.50");
        assert_eq!(format!("{}", Money::zero()), "S/ 0.00");
    }

    #[test]
    fn test_parse_accepts_decimal_text() {
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.00").unwrap().cents(), 1000);
        assert_eq!(Money::parse("5.5").unwrap().cents(), 550);
        assert_eq!(Money::parse(" 0.05 ").unwrap().cents(), 5);
        assert_eq!(Money::parse("-3.25").unwrap().cents(), -325);
        assert_eq!("7.10".parse::<Money>().unwrap().cents(), 710);
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        assert!(matches!(
            Money::parse(""),
            Err(ValidationError::Required { .. })
        ));
        for bad in ["abc", ".50", "10.", "1.234", "1,50", "--1", "1.-5", "99999999999999999999"] {
            assert!(
                matches!(Money::parse(bad), Err(ValidationError::InvalidFormat { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(550);

        assert_eq!((a + b).cents(), 1550);
        assert_eq!((a - b).cents(), 450);
        assert_eq!((a * 3).cents(), 3000);

        let mut c = a;
        c += b;
        c -= Money::from_cents(50);
        assert_eq!(c.cents(), 1500);
    }

    #[test]
    fn test_sum_has_no_drift() {
        // 0.10 added ten times is exactly 1.00
        let total: Money = std::iter::repeat(Money::from_cents(10)).take(10).sum();
        assert_eq!(total, Money::from_cents(100));

        let items = [Money::from_cents(2000), Money::from_cents(550)];
        let total: Money = items.iter().sum();
        assert_eq!(total.cents(), 2550);
    }

    #[test]
    fn test_checked_multiply_quantity() {
        assert_eq!(
            Money::from_cents(299).checked_multiply_quantity(3),
            Some(Money::from_cents(897))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
