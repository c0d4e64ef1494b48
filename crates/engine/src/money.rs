use std::{fmt, str::FromStr};

use crate::{EngineError, ResultEngine};

/// Signed money amount represented as integer **minor units** (e.g. cents).
///
/// Every monetary column in the ledger (prices, totals, balances, payments) is
/// stored in minor units to avoid floating-point drift. This type is the
/// parsing and formatting front-end for those values.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::Validation("empty amount".to_string());
        let invalid = || EngineError::Validation(format!("invalid amount: {s}"));
        let overflow = || EngineError::Validation("amount too large".to_string());

        let trimmed = s.trim();
        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped.trim())
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped.trim())
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let (units_str, cents_str) = match rest.split_once('.') {
            Some((units, cents)) => (units, Some(cents)),
            None => (rest.as_str(), None),
        };

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let units: i64 = units_str.parse().map_err(|_| overflow())?;

        let cents: i64 = match cents_str {
            None | Some("") => 0,
            Some(frac) if !frac.chars().all(|c| c.is_ascii_digit()) => return Err(invalid()),
            Some(frac) if frac.len() == 1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            Some(frac) if frac.len() == 2 => frac.parse::<i64>().map_err(|_| invalid())?,
            Some(_) => return Err(EngineError::Validation("too many decimals".to_string())),
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

/// Invoice-level discount, stored as integer basis points (1% = 100 bp).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscountRate(u32);

impl DiscountRate {
    pub const NONE: DiscountRate = DiscountRate(0);
    pub const MAX_BASIS_POINTS: u32 = 10_000;

    /// Builds a rate from basis points, rejecting anything above 100%.
    pub fn from_basis_points(bp: u32) -> ResultEngine<Self> {
        if bp > Self::MAX_BASIS_POINTS {
            return Err(EngineError::Validation(
                "Discount must be between 0 and 100.".to_string(),
            ));
        }
        Ok(Self(bp))
    }

    /// Builds a rate from a percentage as received over the API.
    ///
    /// The value is rounded to the nearest hundredth of a percent.
    pub fn from_percent(percent: f64) -> ResultEngine<Self> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(EngineError::Validation(
                "Discount must be between 0 and 100.".to_string(),
            ));
        }
        Self::from_basis_points((percent * 100.0).round() as u32)
    }

    #[must_use]
    pub const fn basis_points(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn percent(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Discount amount for `subtotal_minor`, rounded half away from zero.
    #[must_use]
    pub fn apply(self, subtotal_minor: i64) -> i64 {
        let scaled = i128::from(subtotal_minor) * i128::from(self.0);
        let denom = i128::from(Self::MAX_BASIS_POINTS);
        let half = denom / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / denom
        } else {
            (scaled - half) / denom
        };
        rounded as i64
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{whole}%")
        } else {
            write!(f, "{whole}.{frac:02}%")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().minor(), -1);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn discount_rate_bounds() {
        assert!(DiscountRate::from_percent(-1.0).is_err());
        assert!(DiscountRate::from_percent(100.5).is_err());
        assert!(DiscountRate::from_percent(f64::NAN).is_err());
        assert_eq!(DiscountRate::from_percent(100.0).unwrap().basis_points(), 10_000);
        assert_eq!(DiscountRate::from_percent(12.5).unwrap().basis_points(), 1_250);
    }

    #[test]
    fn discount_rounds_half_up() {
        let ten = DiscountRate::from_basis_points(1_000).unwrap();
        assert_eq!(ten.apply(10_000), 1_000);
        // 3.33% of 1.50 = 0.04995 -> 0.05
        let odd = DiscountRate::from_basis_points(333).unwrap();
        assert_eq!(odd.apply(150), 5);
        assert_eq!(DiscountRate::NONE.apply(12_345), 0);
    }

    #[test]
    fn discount_display() {
        assert_eq!(DiscountRate::from_basis_points(1_000).unwrap().to_string(), "10%");
        assert_eq!(DiscountRate::from_basis_points(1_250).unwrap().to_string(), "12.50%");
    }
}
