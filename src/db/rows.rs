//! Row shapes as stored in SQLite and their conversion into model types.
//!
//! Money is kept as decimal text and enums as their serialized names, so every conversion
//! out of a row can fail on a corrupted value.

use crate::model::{
    Amount, Expense, ExpenseCategory, Goal, GoalStatus, QuizAnswer, QuizItem, Tip, User,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::str::FromStr;

fn amount(column: &str, raw: &str) -> Result<Amount> {
    Amount::from_str(raw).with_context(|| format!("Bad {column} value '{raw}' in the database"))
}

fn parsed<T: FromStr>(column: &str, raw: &str) -> Result<T> {
    T::from_str(raw)
        .ok()
        .with_context(|| format!("Bad {column} value '{raw}' in the database"))
}

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            email: r.email,
            name: r.name,
            password_hash: r.password_hash,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct TipRow {
    id: String,
    text: String,
    category: Option<String>,
}

impl From<TipRow> for Tip {
    fn from(r: TipRow) -> Self {
        Tip {
            id: r.id,
            text: r.text,
            category: r.category,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct QuizRow {
    id: String,
    prompt: String,
    answer: String,
    explanation: Option<String>,
}

impl TryFrom<QuizRow> for QuizItem {
    type Error = anyhow::Error;

    fn try_from(r: QuizRow) -> Result<Self> {
        Ok(QuizItem {
            answer: parsed::<QuizAnswer>("answer", &r.answer)?,
            id: r.id,
            prompt: r.prompt,
            explanation: r.explanation,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct GoalRow {
    id: String,
    user_id: String,
    item_name: String,
    target_price: String,
    saved_amount: String,
    status: String,
    purchase_price: Option<String>,
    purchased_at: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GoalRow> for Goal {
    type Error = anyhow::Error;

    fn try_from(r: GoalRow) -> Result<Self> {
        let purchase_price = match r.purchase_price.as_deref() {
            Some(raw) => Some(amount("purchase_price", raw)?),
            None => None,
        };
        Ok(Goal {
            target_price: amount("target_price", &r.target_price)?,
            saved_amount: amount("saved_amount", &r.saved_amount)?,
            status: parsed::<GoalStatus>("status", &r.status)?,
            purchase_price,
            id: r.id,
            user_id: r.user_id,
            item_name: r.item_name,
            purchased_at: r.purchased_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ExpenseRow {
    id: String,
    user_id: String,
    amount: String,
    category: String,
    date: NaiveDate,
    note: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = anyhow::Error;

    fn try_from(r: ExpenseRow) -> Result<Self> {
        Ok(Expense {
            amount: amount("amount", &r.amount)?,
            category: parsed::<ExpenseCategory>("category", &r.category)?,
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            note: r.note,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Converts a batch of rows, failing on the first bad one.
pub(super) fn convert<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}
