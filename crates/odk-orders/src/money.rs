//! Fixed-point money type.
//!
//! All money amounts in this system use a 1e-2 (cents) fixed-point
//! representation stored as `i64`. Using raw `i64` for money is error-prone:
//! it allows accidental arithmetic with unrelated integers (quantities, IDs)
//! without any compile-time signal.
//!
//! `Cents` wraps the raw `i64` so the type system prevents:
//! - Implicit construction from raw `i64` (no `From<i64>` impl).
//! - Mixing `Cents` with unrelated `i64` values in arithmetic.
//!
//! 1 currency unit = `Cents(100)`. Order totals are computed with checked
//! arithmetic only — overflow in a total calculation is a validation error,
//! never a silent wrap or clamp.

use std::ops::{Add, AddAssign, Sub};

// ---------------------------------------------------------------------------
// Cents newtype
// ---------------------------------------------------------------------------

/// A fixed-point monetary amount at 1e-2 scale (cents).
///
/// # Construction
///
/// Use [`Cents::new`] for explicit construction from a raw cent count, or
/// parse a decimal string such as `"13.50"` via [`str::parse`]. There is
/// intentionally no `From<i64>` implementation.
///
/// # Retrieval
///
/// Use [`Cents::raw`] to extract the underlying `i64` when crossing the
/// storage boundary (amounts are persisted as `BIGINT` cents).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    /// Zero monetary amount.
    pub const ZERO: Cents = Cents(0);

    /// Construct a `Cents` from a raw cent count.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Cents(raw)
    }

    /// Extract the underlying raw cent count.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Checked addition. Returns `None` on `i64` overflow.
    #[inline]
    pub fn checked_add(self, rhs: Cents) -> Option<Cents> {
        self.0.checked_add(rhs.0).map(Cents)
    }

    /// Multiply a per-unit price by an integer quantity.
    ///
    /// Returns `None` if the multiplication overflows `i64`. Callers MUST
    /// handle `None` explicitly; overflow in a subtotal is a validation
    /// failure, not a routine saturation.
    ///
    /// `qty` is a plain item count (not a `Cents` value).
    #[inline]
    pub fn checked_mul_qty(self, qty: i64) -> Option<Cents> {
        self.0.checked_mul(qty).map(Cents)
    }

    /// `true` if this amount is non-negative.
    #[inline]
    pub fn is_non_negative(self) -> bool {
        self.0 >= 0
    }
}

// ---------------------------------------------------------------------------
// Arithmetic operators (closed over Cents)
// ---------------------------------------------------------------------------

impl Add for Cents {
    type Output = Cents;
    #[inline]
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Cents;
    #[inline]
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl AddAssign for Cents {
    #[inline]
    fn add_assign(&mut self, rhs: Cents) {
        self.0 += rhs.0;
    }
}

// ---------------------------------------------------------------------------
// Display / parse
// ---------------------------------------------------------------------------

impl std::fmt::Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 / 100;
        let frac = (self.0 % 100).abs();
        // When |value| < 1 unit and the value is negative, `units` truncates
        // to 0, losing the sign. Emit "-0" explicitly in that case.
        if self.0 < 0 && units == 0 {
            write!(f, "-{units}.{frac:02}")
        } else {
            write!(f, "{units}.{frac:02}")
        }
    }
}

/// Returned when a decimal money string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoneyError {
    /// The rejected input, for error reporting.
    pub input: String,
}

impl std::fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid money amount '{}': expected a decimal with at most 2 fractional digits",
            self.input
        )
    }
}

impl std::error::Error for ParseMoneyError {}

impl std::str::FromStr for Cents {
    type Err = ParseMoneyError;

    /// Parse `"5"`, `"5.0"`, `"5.00"`, `"-2.75"` into cents.
    ///
    /// At most 2 fractional digits are accepted; there is no rounding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoneyError { input: s.to_string() };

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            // A bare trailing dot ("5.") is rejected.
            Some((_, "")) => return Err(err()),
            Some((i, fr)) => (i, fr),
            None => (digits, ""),
        };

        if int_part.is_empty() || frac_part.len() > 2 {
            return Err(err());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(err());
        }

        let units: i64 = int_part.parse().map_err(|_| err())?;
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            let parsed: i64 = frac_part.parse().map_err(|_| err())?;
            // "5.5" means 50 cents, not 5.
            if frac_part.len() == 1 {
                parsed * 10
            } else {
                parsed
            }
        };

        let raw = units
            .checked_mul(100)
            .and_then(|u| u.checked_add(frac))
            .ok_or_else(err)?;

        Ok(Cents(if negative { -raw } else { raw }))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_additive_identity() {
        let a = Cents::new(1350);
        assert_eq!(a + Cents::ZERO, a);
        assert_eq!(Cents::ZERO + a, a);
    }

    #[test]
    fn checked_mul_qty_normal() {
        let price = Cents::new(500); // 5.00
        assert_eq!(price.checked_mul_qty(2), Some(Cents::new(1000)));
    }

    #[test]
    fn checked_mul_qty_overflow_returns_none() {
        assert_eq!(Cents::new(i64::MAX).checked_mul_qty(2), None);
    }

    #[test]
    fn checked_add_overflow_returns_none() {
        assert_eq!(Cents::new(i64::MAX).checked_add(Cents::new(1)), None);
    }

    #[test]
    fn display_formats_with_two_decimal_places() {
        assert_eq!(format!("{}", Cents::new(1350)), "13.50");
        assert_eq!(format!("{}", Cents::new(5)), "0.05");
        assert_eq!(format!("{}", Cents::new(0)), "0.00");
    }

    #[test]
    fn display_negative_below_one_unit_keeps_sign() {
        assert_eq!(format!("{}", Cents::new(-75)), "-0.75");
        assert_eq!(format!("{}", Cents::new(-275)), "-2.75");
    }

    #[test]
    fn parse_accepts_zero_one_or_two_fractional_digits() {
        assert_eq!("5".parse::<Cents>().unwrap(), Cents::new(500));
        assert_eq!("5.5".parse::<Cents>().unwrap(), Cents::new(550));
        assert_eq!("5.00".parse::<Cents>().unwrap(), Cents::new(500));
        assert_eq!("13.50".parse::<Cents>().unwrap(), Cents::new(1350));
        assert_eq!("-2.75".parse::<Cents>().unwrap(), Cents::new(-275));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for bad in ["", "-", ".", "1.234", "1.2.3", "abc", "1,50", "5.", "$5"] {
            assert!(bad.parse::<Cents>().is_err(), "should reject {bad:?}");
        }
    }

    #[test]
    fn display_parse_roundtrip() {
        for raw in [0i64, 1, 99, 100, 1350, 123_456_789] {
            let c = Cents::new(raw);
            assert_eq!(format!("{c}").parse::<Cents>().unwrap(), c);
        }
    }

    #[test]
    fn raw_roundtrip() {
        assert_eq!(Cents::new(1350).raw(), 1350);
    }
}
