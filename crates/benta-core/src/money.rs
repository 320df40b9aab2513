//! # Money Module
//!
//! Monetary values in integer centavos.
//!
//! ## Why Integer Money?
//! ```text
//! In floating point:  0.1 + 0.2 = 0.30000000000000004   WRONG
//! In integer centavos: 10 + 20 = 30                      exact
//! ```
//! The database, calculations, and engine all use centavos. The API boundary
//! converts to and from decimal pesos with `rust_decimal`, never `f64` math.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest peso unit).
///
/// - **i64 (signed)**: refunds and manual removals can be negative deltas
/// - **Single-field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Zero money value.
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

    /// Multiplies money by a quantity (line totals).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Converts a decimal peso amount into centavos.
    ///
    /// Amounts with more than two fractional digits are rejected rather than
    /// silently rounded; prices on a shelf never carry sub-centavo precision.
    ///
    /// ## Example
    /// ```rust
    /// use benta_core::money::Money;
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    ///
    /// let price = Money::from_decimal(Decimal::from_str("10.50").unwrap()).unwrap();
    /// assert_eq!(price.centavos(), 1050);
    /// ```
    pub fn from_decimal(pesos: Decimal) -> Result<Self, ValidationError> {
        let scaled = pesos
            .checked_mul(Decimal::from(100))
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: i64::MIN,
                max: i64::MAX,
            })?;
        if scaled.fract() != Decimal::ZERO {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "more than two decimal places".to_string(),
            });
        }
        let centavos = scaled.to_i64().ok_or_else(|| ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: i64::MIN,
            max: i64::MAX,
        })?;
        Ok(Money(centavos))
    }

    /// Converts to a decimal peso amount (for JSON responses).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Peso amount as f64, display use only (2 decimal places are exact).
    #[inline]
    pub fn to_pesos_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug/log formatting. API responses use `to_decimal` instead.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₱{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn from_centavos_roundtrip() {
        let money = Money::from_centavos(1099);
        assert_eq!(money.centavos(), 1099);
    }

    #[test]
    fn display_formats_pesos() {
        assert_eq!(format!("{}", Money::from_centavos(1099)), "₱10.99");
        assert_eq!(format!("{}", Money::from_centavos(500)), "₱5.00");
        assert_eq!(format!("{}", Money::from_centavos(-550)), "-₱5.50");
        assert_eq!(format!("{}", Money::from_centavos(0)), "₱0.00");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_centavos(1000);
        let b = Money::from_centavos(500);

        assert_eq!((a + b).centavos(), 1500);
        assert_eq!((a - b).centavos(), 500);
        assert_eq!((a * 3).centavos(), 3000);
        assert_eq!(a.multiply_quantity(4).centavos(), 4000);
    }

    #[test]
    fn decimal_conversion() {
        let d = Decimal::from_str("10.50").unwrap();
        assert_eq!(Money::from_decimal(d).unwrap().centavos(), 1050);

        let whole = Decimal::from_str("20").unwrap();
        assert_eq!(Money::from_decimal(whole).unwrap().centavos(), 2000);

        assert_eq!(Money::from_centavos(6000).to_decimal(), Decimal::new(6000, 2));
    }

    #[test]
    fn sub_centavo_precision_rejected() {
        let d = Decimal::from_str("10.505").unwrap();
        assert!(Money::from_decimal(d).is_err());
    }

    #[test]
    fn oversized_amounts_error_instead_of_panicking() {
        // Near Decimal::MAX; scaling to centavos would overflow
        let huge = Decimal::from_str("79000000000000000000000000000").unwrap();
        assert!(Money::from_decimal(huge).is_err());

        // Past i64 centavos but within Decimal range
        let big = Decimal::from_str("99999999999999999999").unwrap();
        assert!(Money::from_decimal(big).is_err());
    }

    #[test]
    fn zero_and_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_centavos(100).is_positive());
        assert!(Money::from_centavos(-100).is_negative());
    }
}
