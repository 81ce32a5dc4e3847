use crate::model::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of spending categories an expense can be filed under.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Purchase,
    Accessory,
    Maintenance,
    Subscription,
    #[default]
    Other,
}

serde_plain::derive_display_from_serialize!(ExpenseCategory);
serde_plain::derive_fromstr_from_deserialize!(ExpenseCategory);

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Purchase,
        ExpenseCategory::Accessory,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Subscription,
        ExpenseCategory::Other,
    ];
}

/// A single expense owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub amount: Amount,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Builds a new expense with a fresh id and timestamps.
    pub fn new(
        user_id: impl Into<String>,
        amount: Amount,
        category: ExpenseCategory,
        date: NaiveDate,
        note: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::utils::generate_id(),
            user_id: user_id.into(),
            amount,
            category,
            date,
            note: note.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The editable fields of an expense. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpensePatch {
    pub amount: Option<Amount>,
    pub category: Option<ExpenseCategory>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.note.is_none()
    }

    pub(crate) fn apply(self, expense: &mut Expense) {
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(date) = self.date {
            expense.date = date;
        }
        if let Some(note) = self.note {
            expense.note = note;
        }
        expense.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_round_trips_through_str() {
        for c in ExpenseCategory::ALL {
            assert_eq!(ExpenseCategory::from_str(&c.to_string()).unwrap(), c);
        }
        assert!(ExpenseCategory::from_str("groceries").is_err());
    }

    #[test]
    fn test_default_category_is_other() {
        assert_eq!(ExpenseCategory::default(), ExpenseCategory::Other);
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut e = Expense::new("u1", Amount::from(10u32), ExpenseCategory::Other, date, "bus");
        let patch = ExpensePatch {
            category: Some(ExpenseCategory::Maintenance),
            ..Default::default()
        };
        patch.apply(&mut e);
        assert_eq!(e.category, ExpenseCategory::Maintenance);
        assert_eq!(e.amount, Amount::from(10u32));
        assert_eq!(e.note, "bus");
        assert_eq!(e.date, date);
    }

    #[test]
    fn test_serializes_camel_case() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let e = Expense::new("u1", Amount::from(10u32), ExpenseCategory::Purchase, date, "");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["userId"], "u1");
        assert_eq!(v["category"], "purchase");
        assert_eq!(v["date"], "2024-03-01");
        assert_eq!(v["amount"], 10.0);
    }
}
