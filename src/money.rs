//! Fixed-point monetary values with 2 decimal places.
//!
//! Wraps `rust_decimal` with scale enforcement so balances never drift
//! through floating-point arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// A monetary value that always carries exactly 2 decimal places.
///
/// Values may be negative: a cash box is allowed to run an overdraft.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use cashbox_ledger::Money;
///
/// let amount = Money::from_str("120.5").unwrap();
/// assert_eq!(amount.to_string(), "120.50");
/// assert!(Money::from_str("1.005").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

/// Reasons a string could not be read as [`Money`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    #[error("not a decimal number: {0}")]
    NotANumber(String),

    #[error("more than {} decimal places: {0}", Money::SCALE)]
    TooPrecise(String),
}

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a new `Money` from a `Decimal`, normalizing to 2 decimal places.
    ///
    /// Extra precision is rounded half-to-even (banker's rounding).
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value.round_dp(Self::SCALE);
        normalized.rescale(Self::SCALE);
        Money(normalized)
    }

    /// Builds an amount from integer minor units (piastres, cents).
    pub fn from_minor(minor: i64) -> Self {
        Money(Decimal::new(minor, Self::SCALE))
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Returns `None` when the sum leaves the representable range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money::new)
    }

    /// Returns `None` when the difference leaves the representable range.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Money::new)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)
            .map_err(|_| MoneyParseError::NotANumber(trimmed.to_string()))?;
        if decimal.normalize().scale() > Self::SCALE {
            return Err(MoneyParseError::TooPrecise(trimmed.to_string()));
        }
        Ok(Money::new(decimal))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.0.rescale(Self::SCALE);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
        self.0.rescale(Self::SCALE);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Money::new(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}
