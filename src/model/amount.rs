//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal` so that sums of money never
//! accumulate binary floating point error. Amounts arrive from JSON either as numbers or as
//! strings (which may carry a dollar sign and thousands separators) and are always written back
//! out as JSON numbers.

use anyhow::ensure;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Cents are the smallest unit a user can enter.
const MAX_SCALE: u32 = 2;

/// Represents a dollar amount.
///
/// # Examples
///
/// ```
/// # use edufin::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("$1,250.50").unwrap();
/// let b = Amount::from_str("1250.5").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "$1,250.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// One trillion; accepted amounts have at most twelve integer digits.
    pub const LIMIT: Amount = Amount(Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0));

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns `self` if it is an amount a user may enter, otherwise an error naming the field.
    ///
    /// Accepted amounts are zero or positive, have at most two decimal places and stay below
    /// [`Amount::LIMIT`], which keeps sums and ratios of them well inside `Decimal`'s range.
    pub fn validate(self, what: &str) -> anyhow::Result<Self> {
        let in_range = self.0 < Self::LIMIT.0 && self.0.normalize().scale() <= MAX_SCALE;
        ensure!(!self.is_negative() && in_range, "Invalid {what}");
        Ok(self)
    }

    /// Subtraction that stops at zero.
    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        let v = self.0 - rhs.0;
        if v.is_sign_negative() {
            Amount::ZERO
        } else {
            Amount(v)
        }
    }

    /// Value with trailing zeros removed, used for storage.
    pub(crate) fn to_storage(self) -> String {
        self.0.normalize().to_string()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // "-$50.00", "$50.00" and "50.00" are all accepted
        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            match after_minus.strip_prefix('$') {
                Some(after_dollar) => format!("-{after_dollar}"),
                None => trimmed.to_string(),
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        let without_commas = without_dollar.replace(',', "");
        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.0.abs().round_dp(2);
        write!(
            f,
            "{sign}${}",
            format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
        )
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0.normalize(), serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Decimal::from_f64(v)
            .map(Amount)
            .ok_or_else(|| E::custom(format!("{v} is not a valid amount")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(|e| E::custom(format!("'{v}' is not a valid amount: {e}")))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Amount(Decimal::from(value))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        assert_eq!(amt("$50.00").value(), Decimal::from_str("50.00").unwrap());
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        assert_eq!(amt("-$50.00").value(), Decimal::from_str("-50.00").unwrap());
    }

    #[test]
    fn test_parse_with_commas() {
        assert_eq!(amt("$1,234,567.89").value(), Decimal::from_str("1234567.89").unwrap());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(Amount::from_str("twelve").is_err());
        assert!(Amount::from_str("").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(amt("50").to_string(), "$50.00");
        assert_eq!(amt("-60000").to_string(), "-$60,000.00");
        assert_eq!(Amount::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&amt("50.00")).unwrap(), "50.0");
        assert_eq!(serde_json::to_string(&amt("0.625")).unwrap(), "0.625");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Amount = serde_json::from_str("12.5").unwrap();
        let b: Amount = serde_json::from_str("\"$12.50\"").unwrap();
        let c: Amount = serde_json::from_str("12").unwrap();
        assert_eq!(a, b);
        assert_eq!(c, amt("12"));
    }

    #[test]
    fn test_deserialize_rejects_non_numeric() {
        assert!(serde_json::from_str::<Amount>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Amount>("true").is_err());
        assert!(serde_json::from_str::<Amount>("null").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(amt("0").validate("amount").is_ok());
        assert!(amt("3").validate("amount").is_ok());
        assert!(amt("12.50").validate("amount").is_ok());
        assert!(amt("999,999,999,999.99").validate("amount").is_ok());
        let err = amt("-3").validate("amount").unwrap_err();
        assert_eq!(err.to_string(), "Invalid amount");
    }

    #[test]
    fn test_validate_rejects_huge_and_fractional_cents() {
        assert_eq!(Amount::LIMIT, amt("1000000000000"));
        for s in [
            "1000000000000",
            "79228162514264337593543950335",
            "0.001",
            "0.0000000000000000000000000001",
        ] {
            let err = amt(s).validate("target price").unwrap_err();
            assert_eq!(err.to_string(), "Invalid target price");
        }
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        let total: Amount = std::iter::repeat(amt("0.1")).take(10).sum();
        assert_eq!(total, amt("1"));
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(amt("10").saturating_sub(amt("4")), amt("6"));
        assert_eq!(amt("4").saturating_sub(amt("10")), Amount::ZERO);
    }
}
