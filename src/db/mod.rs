//! Reading, writing and managing the SQLite database.

mod migrations;
mod rows;

use crate::model::{Expense, Goal, QuizItem, Tip, User};
use crate::summary::DateRange;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rows::{ExpenseRow, GoalRow, QuizRow, TipRow, UserRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::debug;

const EXPENSE_COLUMNS: &str =
    "id, user_id, amount, category, date, note, created_at, updated_at";
const GOAL_COLUMNS: &str = "id, user_id, item_name, target_price, saved_amount, status, \
    purchase_price, purchased_at, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, name, password_hash, created_at, updated_at";

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Fails if a file already exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Brings the schema to the current version
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to insert initial schema version")?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created database at {}", path.display());
        Ok(Self { pool })
    }

    /// - Fails if there is no SQLite file at `path`
    /// - Migrates an older schema up to the current version
    /// - Refuses a schema newer than this build understands
    pub(crate) async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let db = Self { pool };
        let version = db.schema_version().await?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than the supported version {}",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&db.pool, version, migrations::CURRENT_VERSION).await?;
        Ok(db)
    }

    pub(crate) async fn schema_version(&self) -> Result<i32> {
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .context("Failed to query schema version")?;
        Ok(row.0)
    }

    // users

    pub(crate) async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(timestamp(user.created_at))
        .bind(timestamp(user.updated_at))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert user '{}'", user.email))?;
        Ok(())
    }

    pub(crate) async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up user by email")?;
        Ok(row.map(User::from))
    }

    pub(crate) async fn user_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up user by id")?;
        Ok(row.map(User::from))
    }

    /// Deletes a user and, through the foreign keys, their goals and expenses.
    pub(crate) async fn delete_user_by_email(&self, email: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }

    // tips and quiz items

    /// Replaces the whole tip set, keeping the given order.
    pub(crate) async fn replace_tips(&self, tips: &[Tip]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        sqlx::query("DELETE FROM tips")
            .execute(&mut *tx)
            .await
            .context("Failed to clear tips")?;
        for (position, tip) in tips.iter().enumerate() {
            sqlx::query("INSERT INTO tips (id, position, text, category) VALUES (?, ?, ?, ?)")
                .bind(&tip.id)
                .bind(position as i64)
                .bind(&tip.text)
                .bind(&tip.category)
                .execute(&mut *tx)
                .await
                .context("Failed to insert tip")?;
        }
        tx.commit().await.context("Failed to commit tips")
    }

    pub(crate) async fn tips(&self) -> Result<Vec<Tip>> {
        let rows: Vec<TipRow> =
            sqlx::query_as("SELECT id, text, category FROM tips ORDER BY position")
                .fetch_all(&self.pool)
                .await
                .context("Failed to query tips")?;
        Ok(rows.into_iter().map(Tip::from).collect())
    }

    pub(crate) async fn replace_quiz_items(&self, items: &[QuizItem]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        sqlx::query("DELETE FROM quiz_items")
            .execute(&mut *tx)
            .await
            .context("Failed to clear quiz items")?;
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quiz_items (id, position, prompt, answer, explanation) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&item.id)
            .bind(position as i64)
            .bind(&item.prompt)
            .bind(item.answer.to_string())
            .bind(&item.explanation)
            .execute(&mut *tx)
            .await
            .context("Failed to insert quiz item")?;
        }
        tx.commit().await.context("Failed to commit quiz items")
    }

    pub(crate) async fn quiz_items(&self) -> Result<Vec<QuizItem>> {
        let rows: Vec<QuizRow> = sqlx::query_as(
            "SELECT id, prompt, answer, explanation FROM quiz_items ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query quiz items")?;
        rows::convert(rows)
    }

    // goals

    /// The user's goals, newest first.
    pub(crate) async fn goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let sql =
            format!("SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ? ORDER BY created_at DESC");
        let rows: Vec<GoalRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query goals")?;
        rows::convert(rows)
    }

    pub(crate) async fn goal(&self, user_id: &str, id: &str) -> Result<Option<Goal>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ? AND id = ?");
        let row: Option<GoalRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query goal")?;
        row.map(Goal::try_from).transpose()
    }

    pub(crate) async fn insert_goal(&self, goal: &Goal) -> Result<()> {
        let sql = format!(
            "INSERT INTO goals ({GOAL_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(&goal.id)
            .bind(&goal.user_id)
            .bind(&goal.item_name)
            .bind(goal.target_price.to_storage())
            .bind(goal.saved_amount.to_storage())
            .bind(goal.status.to_string())
            .bind(goal.purchase_price.map(|p| p.to_storage()))
            .bind(goal.purchased_at)
            .bind(timestamp(goal.created_at))
            .bind(timestamp(goal.updated_at))
            .execute(&self.pool)
            .await
            .context("Failed to insert goal")?;
        Ok(())
    }

    /// Writes every mutable field of `goal`. Returns false when the caller does not own a goal
    /// with that id.
    pub(crate) async fn update_goal(&self, goal: &Goal) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE goals SET item_name = ?, target_price = ?, saved_amount = ?, status = ?, \
             purchase_price = ?, purchased_at = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&goal.item_name)
        .bind(goal.target_price.to_storage())
        .bind(goal.saved_amount.to_storage())
        .bind(goal.status.to_string())
        .bind(goal.purchase_price.map(|p| p.to_storage()))
        .bind(goal.purchased_at)
        .bind(timestamp(goal.updated_at))
        .bind(&goal.id)
        .bind(&goal.user_id)
        .execute(&self.pool)
        .await
        .context("Failed to update goal")?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn delete_goal(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete goal")?;
        Ok(result.rows_affected() > 0)
    }

    // expenses

    /// The user's expenses inside `range`, newest date first and then newest created first.
    /// `limit` of `None` returns every match.
    pub(crate) async fn expenses(
        &self,
        user_id: &str,
        range: &DateRange,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<Expense>> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE user_id = ?1 AND (?2 IS NULL OR date >= ?2) AND (?3 IS NULL OR date < ?3) \
             ORDER BY date DESC, created_at DESC LIMIT ?4 OFFSET ?5"
        );
        let rows: Vec<ExpenseRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(range.from())
            .bind(range.to())
            // a negative limit means no limit in SQLite
            .bind(limit.map_or(-1, i64::from))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .context("Failed to query expenses")?;
        rows::convert(rows)
    }

    pub(crate) async fn expense(&self, user_id: &str, id: &str) -> Result<Option<Expense>> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = ? AND id = ?");
        let row: Option<ExpenseRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query expense")?;
        row.map(Expense::try_from).transpose()
    }

    pub(crate) async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        let sql = format!(
            "INSERT INTO expenses ({EXPENSE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(&expense.id)
            .bind(&expense.user_id)
            .bind(expense.amount.to_storage())
            .bind(expense.category.to_string())
            .bind(expense.date)
            .bind(&expense.note)
            .bind(timestamp(expense.created_at))
            .bind(timestamp(expense.updated_at))
            .execute(&self.pool)
            .await
            .context("Failed to insert expense")?;
        Ok(())
    }

    pub(crate) async fn update_expense(&self, expense: &Expense) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE expenses SET amount = ?, category = ?, date = ?, note = ?, updated_at = ? \
             WHERE id = ? AND user_id = ?",
        )
        .bind(expense.amount.to_storage())
        .bind(expense.category.to_string())
        .bind(expense.date)
        .bind(&expense.note)
        .bind(timestamp(expense.updated_at))
        .bind(&expense.id)
        .bind(&expense.user_id)
        .execute(&self.pool)
        .await
        .context("Failed to update expense")?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn delete_expense(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete expense")?;
        Ok(result.rows_affected() > 0)
    }

    // key-value

    pub(crate) async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key '{key}'"))?;
        Ok(row.map(|(value,)| value))
    }

    /// Stores `value` under `key`, overwriting any earlier value.
    pub(crate) async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT (key) DO UPDATE \
             SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write key '{key}'"))?;
        Ok(())
    }
}

/// Timestamps are stored with a fixed number of fractional digits so they sort as text.
fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open SQLite database at {}", path.display()))
}

/// True when `e` was caused by a UNIQUE constraint, e.g. a duplicate email.
pub(crate) fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.chain()
        .filter_map(|cause| cause.downcast_ref::<sqlx::Error>())
        .any(|err| match err {
            sqlx::Error::Database(db) => db.is_unique_violation(),
            _ => false,
        })
}
