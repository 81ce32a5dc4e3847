//! Savings calculators.

use crate::model::Amount;
use anyhow::{ensure, Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

const DAYS_PER_YEAR: u64 = 365;
const DAYS_PER_MONTH: u64 = 30;

/// How much to put aside every day to reach a target in a number of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTarget {
    pub target: Amount,
    pub days: u32,
    /// Rounded to cents.
    pub per_day: Amount,
    /// `days` written out in years, months and days.
    pub timeframe: String,
}

/// How long it takes to reach a target saving a fixed amount every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingDuration {
    pub target: Amount,
    pub daily: Amount,
    /// Whole days, rounded up.
    pub days: u64,
    pub text: String,
}

pub fn daily_target(target: Amount, days: u32) -> Result<DailyTarget> {
    ensure!(target.value() > Decimal::ZERO, "The target must be greater than zero");
    ensure!(days > 0, "The number of days must be greater than zero");
    let per_day = (target.value() / Decimal::from(days))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(DailyTarget {
        target,
        days,
        per_day: Amount::new(per_day),
        timeframe: format_days(u64::from(days)),
    })
}

pub fn duration(target: Amount, daily: Amount) -> Result<SavingDuration> {
    ensure!(target.value() > Decimal::ZERO, "The target must be greater than zero");
    ensure!(daily.value() > Decimal::ZERO, "The daily amount must be greater than zero");
    let days = target
        .value()
        .checked_div(daily.value())
        .and_then(|d| d.ceil().to_u64())
        .context("The duration is too long to compute")?;
    Ok(SavingDuration {
        target,
        daily,
        days,
        text: format_days(days),
    })
}

/// Writes a day count as e.g. "1 year, 2 months, 5 days" using 365-day years and 30-day months.
/// Zero parts are left out, except that zero days reads "0 days".
pub fn format_days(days: u64) -> String {
    let years = days / DAYS_PER_YEAR;
    let months = (days % DAYS_PER_YEAR) / DAYS_PER_MONTH;
    let rest = days - years * DAYS_PER_YEAR - months * DAYS_PER_MONTH;

    let mut parts = Vec::new();
    if years > 0 {
        parts.push(plural(years, "year"));
    }
    if months > 0 {
        parts.push(plural(months, "month"));
    }
    if rest > 0 || parts.is_empty() {
        parts.push(plural(rest, "day"));
    }
    parts.join(", ")
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(0), "0 days");
        assert_eq!(format_days(1), "1 day");
        assert_eq!(format_days(30), "1 month");
        assert_eq!(format_days(365), "1 year");
        assert_eq!(format_days(400), "1 year, 1 month, 5 days");
        assert_eq!(format_days(760), "2 years, 1 month");
        assert_eq!(format_days(95), "3 months, 5 days");
    }

    #[test]
    fn test_daily_target() {
        let t = daily_target(amt("1000"), 30).unwrap();
        assert_eq!(t.per_day, amt("33.33"));
        assert_eq!(t.timeframe, "1 month");
        assert_eq!(daily_target(amt("100"), 8).unwrap().per_day, amt("12.5"));
    }

    #[test]
    fn test_daily_target_rejects_non_positive() {
        assert!(daily_target(amt("0"), 10).is_err());
        assert!(daily_target(amt("-5"), 10).is_err());
        assert!(daily_target(amt("10"), 0).is_err());
    }

    #[test]
    fn test_duration_rounds_up() {
        let d = duration(amt("1000"), amt("3")).unwrap();
        assert_eq!(d.days, 334);
        assert_eq!(d.text, "11 months, 4 days");
        assert_eq!(duration(amt("90"), amt("3")).unwrap().days, 30);
    }

    #[test]
    fn test_duration_rejects_non_positive() {
        assert!(duration(amt("100"), amt("0")).is_err());
        assert!(duration(amt("0"), amt("1")).is_err());
    }

    #[test]
    fn test_duration_too_long() {
        let err = duration(amt("79228162514264337593543950335"), amt("0.0000000001")).unwrap_err();
        assert_eq!(err.to_string(), "The duration is too long to compute");
        let err = duration(amt("100000000000000000000"), amt("1")).unwrap_err();
        assert_eq!(err.to_string(), "The duration is too long to compute");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(duration(amt("10"), amt("4")).unwrap()).unwrap();
        assert_eq!(json["days"], 3);
        assert_eq!(json["text"], "3 days");
    }
}
