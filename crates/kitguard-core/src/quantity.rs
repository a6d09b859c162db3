//! # Quantity Module
//!
//! Provides the `Quantity` type for stock and BOM quantities.
//!
//! ## Why Fixed-Point?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM (again)                                     │
//! │                                                                         │
//! │  BOM line: 0.1 kg flour per cake, 3 cakes requested                     │
//! │    0.1 * 3 = 0.30000000000000004  ❌                                    │
//! │    available = 0.3 → "shortage" of 0.00000000000000004 kg               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer thousandths ("milli-units")                      │
//! │    100 milli * 3 = 300 milli == 300 milli available  ✅                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Three decimal places match the default unit-of-measure precision of the
//! back-office catalog. Anything finer is rejected at parse time.
//!
//! ## Usage
//! ```rust
//! use kitguard_core::quantity::Quantity;
//!
//! let per_kit = Quantity::parse("2").unwrap();
//! let kits = Quantity::from_units(3);
//! assert_eq!(per_kit.times(kits), Quantity::from_units(6));
//! assert_eq!(Quantity::from_milli(2500).to_string(), "2.5");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::error::InputError;

/// Milli-units per whole unit.
pub const SCALE: i64 = 1000;

/// Number of decimal places carried by a `Quantity`.
pub const DECIMALS: usize = 3;

// =============================================================================
// Quantity Type
// =============================================================================

/// A stock or BOM quantity in thousandths of the product's unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: stock can be negative in the back office (oversold)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as decimal text**: `"2.5"`, never a JSON float
///
/// ## Where Quantity is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Component.unit_quantity ──┐                                            │
/// │                            ├──► required = unit × kit qty               │
/// │  OrderLine.quantity ───────┘          │                                 │
/// │                                       ▼                                 │
/// │  StockSource::get_available_quantity ─► available < required?           │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │                                   "Flour: available=5, required=6"      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from milli-units (the storage representation).
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a quantity from whole units, saturating on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use kitguard_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(3).milli(), 3000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units.saturating_mul(SCALE))
    }

    /// Returns the value in milli-units.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Zero quantity.
    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the quantity is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true when the value is a whole number of units.
    #[inline]
    pub const fn is_whole(&self) -> bool {
        self.0 % SCALE == 0
    }

    /// Multiplies two quantities (per-kit requirement × kit count).
    ///
    /// ## Rounding
    /// The exact product carries six decimals; it is brought back to three
    /// with round-half-to-even, the same rounding used for money. The result
    /// saturates instead of overflowing, so an absurd requirement always
    /// compares as a shortage.
    ///
    /// ## Example
    /// ```rust
    /// use kitguard_core::quantity::Quantity;
    ///
    /// let per_kit = Quantity::from_milli(125); // 0.125
    /// let kits = Quantity::from_units(3);
    /// assert_eq!(per_kit.times(kits).to_string(), "0.375");
    /// ```
    pub fn times(&self, other: Quantity) -> Quantity {
        let product = self.0 as i128 * other.0 as i128;
        let scale = SCALE as i128;
        let quotient = product / scale;
        let remainder = product % scale;

        // Half-to-even on the dropped digits
        let twice = remainder.abs() * 2;
        let rounded = if twice > scale || (twice == scale && quotient % 2 != 0) {
            quotient + product.signum()
        } else {
            quotient
        };

        let clamped = rounded.clamp(i64::MIN as i128, i64::MAX as i128);
        Quantity(clamped as i64)
    }

    /// Parses decimal text such as `"2"`, `"2.5"`, `"-0.125"`.
    ///
    /// ## Rules
    /// - Optional leading `-` or `+`
    /// - At most three fractional digits
    /// - No exponent, no thousands separators
    pub fn parse(text: &str) -> Result<Quantity, InputError> {
        let invalid = |reason: &str| InputError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let text = text.trim();
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            Some(_) => (false, text),
            None => return Err(invalid("must not be empty")),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("must contain digits"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("must be a plain decimal number"));
        }
        if fraction.len() > DECIMALS {
            return Err(invalid("at most 3 decimal places are supported"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("is too large"))?
        };
        let mut milli_part: i64 = 0;
        for (i, b) in fraction.bytes().enumerate() {
            milli_part += i64::from(b - b'0') * 10_i64.pow((DECIMALS - 1 - i) as u32);
        }

        let magnitude = whole
            .checked_mul(SCALE)
            .and_then(|m| m.checked_add(milli_part))
            .ok_or_else(|| invalid("is too large"))?;

        Ok(Quantity(if negative { -magnitude } else { magnitude }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shortest decimal form: `6`, `2.5`, `0.125`, `-1.2`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE as u64;
        let fraction = abs % SCALE as u64;

        if fraction == 0 {
            return write!(f, "{}{}", sign, whole);
        }

        let digits = format!("{:03}", fraction);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0.saturating_sub(other.0))
    }
}

impl From<i64> for Quantity {
    /// Whole units.
    fn from(units: i64) -> Self {
        Quantity::from_units(units)
    }
}

// =============================================================================
// Serde (decimal text on the wire)
// =============================================================================

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string such as \"2.5\" or a whole number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        Quantity::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        v.checked_mul(SCALE)
            .map(Quantity)
            .ok_or_else(|| E::custom("quantity is too large"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        i64::try_from(v)
            .map_err(|_| E::custom("quantity is too large"))
            .and_then(|v| self.visit_i64(v))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let qty = Quantity::from_units(5);
        assert_eq!(qty.milli(), 5000);
        assert!(qty.is_whole());
        assert!(qty.is_positive());
    }

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(Quantity::from_units(6).to_string(), "6");
        assert_eq!(Quantity::from_milli(2500).to_string(), "2.5");
        assert_eq!(Quantity::from_milli(125).to_string(), "0.125");
        assert_eq!(Quantity::from_milli(-1200).to_string(), "-1.2");
        assert_eq!(Quantity::zero().to_string(), "0");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Quantity::parse("2").unwrap(), Quantity::from_units(2));
        assert_eq!(Quantity::parse("2.5").unwrap().milli(), 2500);
        assert_eq!(Quantity::parse(".5").unwrap().milli(), 500);
        assert_eq!(Quantity::parse("-0.125").unwrap().milli(), -125);
        assert_eq!(Quantity::parse(" 7 ").unwrap(), Quantity::from_units(7));

        assert!(Quantity::parse("").is_err());
        assert!(Quantity::parse("-").is_err());
        assert!(Quantity::parse("1.2345").is_err());
        assert!(Quantity::parse("1e3").is_err());
        assert!(Quantity::parse("1,000").is_err());
    }

    #[test]
    fn test_times_whole_numbers() {
        let per_kit = Quantity::from_units(2);
        assert_eq!(per_kit.times(Quantity::from_units(3)), Quantity::from_units(6));
    }

    #[test]
    fn test_times_fractional_is_exact() {
        // 0.1 × 3 must be exactly 0.3
        let per_kit = Quantity::from_milli(100);
        assert_eq!(per_kit.times(Quantity::from_units(3)).milli(), 300);
    }

    #[test]
    fn test_times_rounds_half_to_even() {
        // 0.005 × 0.5 = 0.0025 → 0.002
        let a = Quantity::from_milli(5);
        let half = Quantity::from_milli(500);
        assert_eq!(a.times(half).milli(), 2);

        // 0.015 × 0.5 = 0.0075 → 0.008
        let b = Quantity::from_milli(15);
        assert_eq!(b.times(half).milli(), 8);
    }

    #[test]
    fn test_times_saturates() {
        let huge = Quantity::from_milli(i64::MAX);
        assert_eq!(huge.times(Quantity::from_units(10)).milli(), i64::MAX);
    }

    #[test]
    fn test_serde_as_decimal_text() {
        let json = serde_json::to_string(&Quantity::from_milli(2500)).unwrap();
        assert_eq!(json, "\"2.5\"");

        let from_text: Quantity = serde_json::from_str("\"0.25\"").unwrap();
        assert_eq!(from_text.milli(), 250);

        let from_int: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(from_int, Quantity::from_units(4));

        assert!(serde_json::from_str::<Quantity>("1.5").is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        assert!(Quantity::from_units(5) < Quantity::from_units(6));
        assert!(Quantity::from_milli(-1) < Quantity::zero());
    }
}
