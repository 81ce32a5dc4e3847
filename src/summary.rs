//! Expense summaries: totals by category and by month within a half-open date window.
//!
//! All arithmetic is done in `Decimal` so that totals and shares are exact for the amounts users
//! actually enter.

use crate::model::{Amount, Expense, ExpenseCategory};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A half-open window `[from, to)` over calendar dates. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    pub const UNBOUNDED: DateRange = DateRange {
        from: None,
        to: None,
    };

    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Parses optional ISO `YYYY-MM-DD` bounds. Blank strings count as absent; anything else
    /// that is not a date is an error.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self> {
        Ok(Self {
            from: parse_bound("from", from)?,
            to: parse_bound("to", to)?,
        })
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    /// `from` is inclusive, `to` is exclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date < to)
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .with_context(|| format!("Invalid '{name}' date '{s}', expected YYYY-MM-DD")),
    }
}

/// Named windows ending at the first day of the month after `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePreset {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
    #[serde(rename = "all")]
    All,
}

serde_plain::derive_display_from_serialize!(RangePreset);
serde_plain::derive_fromstr_from_deserialize!(RangePreset);

impl RangePreset {
    /// The window covering the current month and the `n - 1` months before it.
    pub fn window(self, today: NaiveDate) -> Result<DateRange> {
        let months = match self {
            RangePreset::OneMonth => 1,
            RangePreset::ThreeMonths => 3,
            RangePreset::TwelveMonths => 12,
            RangePreset::All => return Ok(DateRange::UNBOUNDED),
        };
        let this_month = today
            .with_day(1)
            .context("Unable to find the first day of the month")?;
        let to = this_month
            .checked_add_months(Months::new(1))
            .context("Date range end is out of bounds")?;
        let from = to
            .checked_sub_months(Months::new(months))
            .context("Date range start is out of bounds")?;
        Ok(DateRange::new(Some(from), Some(to)))
    }
}

/// Resolves the `range`/`from`/`to` triple accepted by summary queries.
pub fn resolve_range(
    range: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange> {
    let has_bounds = [from, to]
        .iter()
        .any(|b| b.is_some_and(|s| !s.trim().is_empty()));
    match range.map(str::trim).filter(|s| !s.is_empty()) {
        None => DateRange::parse(from, to),
        Some(_) if has_bounds => bail!("Use either 'range' or 'from'/'to', not both"),
        Some(name) => RangePreset::from_str(name)
            .ok()
            .with_context(|| format!("Invalid range '{name}', expected one of 1m, 3m, 12m, all"))?
            .window(today),
    }
}

/// Spending in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: Amount,
    /// Fraction of the window's total, 0 when the total is 0.
    #[serde(with = "rust_decimal::serde::float")]
    pub share: Decimal,
}

/// Spending in one calendar month, labelled `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotal {
    pub month: String,
    pub total: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total: Amount,
    pub by_category: Vec<CategoryTotal>,
    pub by_month: Vec<MonthTotal>,
    pub top_category: Option<CategoryTotal>,
}

/// Summarizes the expenses that fall inside `range`.
///
/// Categories are ordered by descending total; equal totals keep the order in which their
/// category was first seen in `expenses`. Months are ordered ascending.
pub fn summarize<'a, I>(expenses: I, range: &DateRange) -> ExpenseSummary
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut total = Amount::ZERO;
    let mut by_category: Vec<(ExpenseCategory, Amount)> = Vec::new();
    let mut by_month: BTreeMap<(i32, u32), Amount> = BTreeMap::new();

    for expense in expenses.into_iter().filter(|e| range.contains(e.date)) {
        total += expense.amount;

        match by_category.iter_mut().find(|(c, _)| *c == expense.category) {
            Some((_, sum)) => *sum += expense.amount,
            None => by_category.push((expense.category, expense.amount)),
        }

        *by_month
            .entry((expense.date.year(), expense.date.month()))
            .or_default() += expense.amount;
    }

    // stable: ties keep first-seen order
    by_category.sort_by(|a, b| b.1.cmp(&a.1));

    let by_category: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, sum)| CategoryTotal {
            category,
            total: sum,
            share: share(sum, total),
        })
        .collect();

    let by_month = by_month
        .into_iter()
        .map(|((year, month), sum)| MonthTotal {
            month: format!("{year:04}-{month:02}"),
            total: sum,
        })
        .collect();

    ExpenseSummary {
        total,
        top_category: by_category.first().cloned(),
        by_category,
        by_month,
    }
}

fn share(part: Amount, total: Amount) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        (part.value() / total.value()).normalize()
    }
}
