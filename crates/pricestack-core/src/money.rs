//! # Money Module
//!
//! Provides the `Money` amount and the `CurrencyCode` it is quoted in.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BUNDLE PRICES ARE SUMS OF SUMS                                         │
//! │                                                                         │
//! │  A calculated bundle adds up every constituent, each of which may be   │
//! │  a nested bundle adding up its own constituents. With floats:          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │  and the error compounds at every level of the tree.                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    10.00 + 0.10 + 0.20 = 1000 + 10 + 20 = 1030 cents, exactly          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pricestack_core::money::Money;
//!
//! let list = Money::from_cents(10000); // 100.00
//! let adjustment = Money::from_cents(-150_000);
//!
//! // Calculated bundles never let a contribution go below zero
//! assert_eq!((list + adjustment).floor_at_zero(), Money::zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: price adjustments are signed deltas
/// - **No currency field**: a `Price` carries the currency once for all tiers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use pricestack_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }


    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero.
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

    /// Clamps negative amounts to zero.
    ///
    /// ```rust
    /// use pricestack_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-1).floor_at_zero(), Money::zero());
    /// assert_eq!(Money::from_cents(250).floor_at_zero().cents(), 250);
    /// ```
    #[inline]
    pub const fn floor_at_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Keeps only the non-positive part of an amount.
    ///
    /// Used for calculated-bundle adjustments, where an increase never
    /// applies: `min(adjustment, 0)`.
    #[inline]
    pub const fn min_zero(self) -> Self {
        if self.0 > 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies by a unit quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Renders `"-12.50"` style amounts; currency symbols are a display concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
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
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Currency Code
// =============================================================================

/// ISO 4217 alphabetic currency code ("USD", "CAD", "EUR").
///
/// Price lists, stacks and prices are all scoped to one currency; the engine
/// never converts between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// ```rust
    /// use pricestack_core::money::CurrencyCode;
    ///
    /// assert_eq!(CurrencyCode::parse("cad").unwrap().as_str(), "CAD");
    /// assert!(CurrencyCode::parse("CA").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: format!("'{}' is not a three-letter ISO 4217 code", code),
            });
        }
        Ok(CurrencyCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_sum() {
        let amounts = [
            Money::from_cents(500),
            Money::from_cents(-300),
            Money::from_cents(200),
        ];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 400);

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_floor_and_min_zero() {
        assert_eq!(Money::from_cents(-100_000).floor_at_zero(), Money::zero());
        assert_eq!(Money::from_cents(700).floor_at_zero().cents(), 700);

        assert_eq!(Money::from_cents(500).min_zero(), Money::zero());
        assert_eq!(Money::from_cents(-300).min_zero().cents(), -300);
        assert_eq!(Money::zero().min_zero(), Money::zero());
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::zero().is_positive());
        assert!(!Money::zero().is_negative());
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!(CurrencyCode::parse(" usd ").unwrap().as_str(), "USD");
        assert!(CurrencyCode::parse("").is_err());
        assert!(CurrencyCode::parse("US1").is_err());
        assert!(CurrencyCode::parse("DOLLAR").is_err());
    }

    #[test]
    fn test_currency_code_rejected_on_deserialize() {
        let ok: Result<CurrencyCode, _> = serde_json::from_str("\"eur\"");
        assert_eq!(ok.unwrap().as_str(), "EUR");

        let bad: Result<CurrencyCode, _> = serde_json::from_str("\"euro\"");
        assert!(bad.is_err());
    }
}
