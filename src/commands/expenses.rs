//! Expense handlers. Every operation is scoped to the calling user.

use crate::args::{ListExpensesArgs, NewExpenseArgs, SummaryArgs, UpdateExpenseArgs};
use crate::commands::{count, Ack, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{normalize_email, Expense, ExpensePatch};
use crate::summary::{resolve_range, summarize, DateRange, ExpenseSummary};
use crate::{Config, Error, Result};
use chrono::{NaiveDate, Utc};
use tracing::debug;

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 200;

fn not_found() -> Error {
    Error::msg(ErrorType::NotFound, "Expense not found")
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Lists the caller's expenses in the `from`/`to` window, newest first, one page at a time.
pub async fn list_expenses(
    config: Config,
    user_id: &str,
    args: ListExpensesArgs,
) -> Result<Out<Vec<Expense>>> {
    let range = DateRange::parse(args.from.as_deref(), args.to.as_deref())
        .pub_result(ErrorType::Request)?;
    let page = args.page.unwrap_or(1).max(1);
    let limit = args
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let expenses = config
        .db()
        .expenses(user_id, &range, Some(limit), offset)
        .await
        .pub_result(ErrorType::Database)?;
    Ok(Out::new(
        format!("Found {}", count(expenses.len(), "expense", "expenses")),
        expenses,
    ))
}

/// Records an expense. Category defaults to `other`, the date to today and the note to empty.
///
/// # Errors
/// - `Request` "Invalid amount" for a negative amount, fractions of a cent or one trillion and up
pub async fn create_expense(
    config: Config,
    user_id: &str,
    args: NewExpenseArgs,
) -> Result<Out<Expense>> {
    let amount = args
        .amount
        .validate("amount")
        .pub_result(ErrorType::Request)?;
    let expense = Expense::new(
        user_id,
        amount,
        args.category.unwrap_or_default(),
        args.date.unwrap_or_else(today),
        args.note.unwrap_or_default(),
    );
    config
        .db()
        .insert_expense(&expense)
        .await
        .pub_result(ErrorType::Database)?;
    debug!("Created expense {} for {user_id}", expense.id);
    Ok(Out::new(format!("Recorded {}", expense.amount), expense))
}

/// Changes the given fields of one of the caller's expenses.
pub async fn update_expense(
    config: Config,
    user_id: &str,
    id: &str,
    args: UpdateExpenseArgs,
) -> Result<Out<Expense>> {
    let amount = match args.amount {
        Some(a) => Some(a.validate("amount").pub_result(ErrorType::Request)?),
        None => None,
    };
    let patch = ExpensePatch {
        amount,
        category: args.category,
        date: args.date,
        note: args.note,
    };

    let db = config.db();
    let mut expense = db
        .expense(user_id, id)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(not_found)?;
    if patch.is_empty() {
        return Ok(Out::new("Nothing to update", expense));
    }
    patch.apply(&mut expense);
    if !db
        .update_expense(&expense)
        .await
        .pub_result(ErrorType::Database)?
    {
        return Err(not_found());
    }
    Ok(Out::new(format!("Updated expense {id}"), expense))
}

pub async fn delete_expense(config: Config, user_id: &str, id: &str) -> Result<Out<Ack>> {
    if !config
        .db()
        .delete_expense(user_id, id)
        .await
        .pub_result(ErrorType::Database)?
    {
        return Err(not_found());
    }
    Ok(Out::new(format!("Deleted expense {id}"), Ack::OK))
}

/// Summarizes the caller's expenses in the window given by `range` or by `from`/`to`.
///
/// # Errors
/// - `Request` for a malformed date, an unknown range preset, or a range combined with bounds
pub async fn expense_summary(
    config: Config,
    user_id: &str,
    args: SummaryArgs,
) -> Result<Out<ExpenseSummary>> {
    let range = resolve_range(
        args.range.as_deref(),
        args.from.as_deref(),
        args.to.as_deref(),
        today(),
    )
    .pub_result(ErrorType::Request)?;
    let expenses = config
        .db()
        .expenses(user_id, &range, None, 0)
        .await
        .pub_result(ErrorType::Database)?;
    let summary = summarize(&expenses, &range);
    let message = match &summary.top_category {
        Some(top) => format!(
            "Spent {} in total, mostly on {}",
            summary.total, top.category
        ),
        None => "No expenses in this period".to_string(),
    };
    Ok(Out::new(message, summary))
}

/// The command-line variant of [`expense_summary`], addressing the user by email.
pub async fn user_summary(
    config: Config,
    email: &str,
    args: SummaryArgs,
) -> Result<Out<ExpenseSummary>> {
    let email = normalize_email(email);
    let user = config
        .db()
        .user_by_email(&email)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(|| Error::msg(ErrorType::NotFound, format!("No user with email {email}")))?;
    expense_summary(config, &user.id, args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, ExpenseCategory};
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn new_expense(amount: &str, category: ExpenseCategory, day: &str) -> NewExpenseArgs {
        NewExpenseArgs {
            amount: amt(amount),
            category: Some(category),
            date: Some(date(day)),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let env = TestEnv::new().await;
        let user = env.insert_user("a@b.c").await;
        let args = NewExpenseArgs {
            amount: amt("12.5"),
            category: None,
            date: None,
            note: None,
        };
        let out = create_expense(env.config(), &user.id, args).await.unwrap();
        let e = out.structure().unwrap();
        assert_eq!(e.category, ExpenseCategory::Other);
        assert_eq!(e.date, today());
        assert_eq!(e.note, "");
        assert_eq!(out.message(), "Recorded $12.50");
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let env = TestEnv::new().await;
        let user = env.insert_user("a@b.c").await;
        let err = create_expense(
            env.config(),
            &user.id,
            new_expense("-1", ExpenseCategory::Other, "2024-01-01"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
        assert_eq!(err.to_string(), "Invalid amount");
    }

    #[tokio::test]
    async fn test_out_of_range_amounts_rejected() {
        let env = TestEnv::new().await;
        let user = env.insert_user("a@b.c").await;
        for amount in ["79228162514264337593543950335", "1000000000000", "0.005"] {
            let err = create_expense(
                env.config(),
                &user.id,
                new_expense(amount, ExpenseCategory::Other, "2024-01-01"),
            )
            .await
            .unwrap_err();
            assert_eq!(err.error_type(), ErrorType::Request);
            assert_eq!(err.to_string(), "Invalid amount");
        }

        let out = create_expense(
            env.config(),
            &user.id,
            new_expense("999999999999.99", ExpenseCategory::Other, "2024-01-01"),
        )
        .await
        .unwrap();
        let id = out.structure().unwrap().id.clone();
        let bad = UpdateExpenseArgs {
            amount: Some(amt("79228162514264337593543950335")),
            ..Default::default()
        };
        let err = update_expense(env.config(), &user.id, &id, bad)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
        assert_eq!(err.to_string(), "Invalid amount");

        create_expense(
            env.config(),
            &user.id,
            new_expense("999999999999.99", ExpenseCategory::Other, "2024-01-02"),
        )
        .await
        .unwrap();
        let all = SummaryArgs {
            range: Some("all".to_string()),
            ..Default::default()
        };
        let out = expense_summary(env.config(), &user.id, all).await.unwrap();
        assert_eq!(out.structure().unwrap().total, amt("1999999999999.98"));
    }

    #[tokio::test]
    async fn test_list_paging_and_window() {
        let env = TestEnv::new().await;
        let user = env.insert_user("a@b.c").await;
        for day in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            create_expense(
                env.config(),
                &user.id,
                new_expense("1", ExpenseCategory::Other, day),
            )
            .await
            .unwrap();
        }

        let args = ListExpensesArgs {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        };
        let out = list_expenses(env.config(), &user.id, args).await.unwrap();
        let page = out.structure().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].date, date("2024-01-01"));

        let args = ListExpensesArgs {
            from: Some("2024-01-02".to_string()),
            limit: Some(0),
            ..Default::default()
        };
        let out = list_expenses(env.config(), &user.id, args).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 1);

        let args = ListExpensesArgs {
            to: Some("January".to_string()),
            ..Default::default()
        };
        let err = list_expenses(env.config(), &user.id, args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
    }

    #[tokio::test]
    async fn test_update_and_delete_are_scoped() {
        let env = TestEnv::new().await;
        let owner = env.insert_user("a@b.c").await;
        let other = env.insert_user("x@y.z").await;
        let out = create_expense(
            env.config(),
            &owner.id,
            new_expense("5", ExpenseCategory::Purchase, "2024-01-01"),
        )
        .await
        .unwrap();
        let id = out.structure().unwrap().id.clone();

        let changes = UpdateExpenseArgs {
            note: Some("snacks".to_string()),
            ..Default::default()
        };
        let err = update_expense(env.config(), &other.id, &id, changes.clone())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
        assert_eq!(err.to_string(), "Expense not found");

        let out = update_expense(env.config(), &owner.id, &id, changes)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().note, "snacks");
        assert_eq!(out.structure().unwrap().amount, amt("5"));

        let bad = UpdateExpenseArgs {
            amount: Some(amt("-3")),
            ..Default::default()
        };
        let err = update_expense(env.config(), &owner.id, &id, bad)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);

        let err = delete_expense(env.config(), &other.id, &id).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
        let out = delete_expense(env.config(), &owner.id, &id).await.unwrap();
        assert_eq!(out.structure(), Some(&Ack::OK));
    }

    #[tokio::test]
    async fn test_summary_window() {
        let env = TestEnv::new().await;
        let user = env.insert_user("a@b.c").await;
        for (amount, category, day) in [
            ("50", ExpenseCategory::Purchase, "2024-01-05"),
            ("30", ExpenseCategory::Other, "2024-01-20"),
            ("20", ExpenseCategory::Purchase, "2024-02-01"),
        ] {
            create_expense(env.config(), &user.id, new_expense(amount, category, day))
                .await
                .unwrap();
        }

        let args = SummaryArgs {
            range: None,
            from: Some("2024-01-01".to_string()),
            to: Some("2024-02-01".to_string()),
        };
        let out = expense_summary(env.config(), &user.id, args.clone())
            .await
            .unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total, amt("80"));
        assert_eq!(summary.by_category.len(), 2);
        assert_eq!(
            summary.top_category.as_ref().unwrap().category,
            ExpenseCategory::Purchase
        );
        assert_eq!(out.message(), "Spent $80.00 in total, mostly on purchase");

        let out = user_summary(env.config(), "A@B.C", args).await.unwrap();
        assert_eq!(out.structure().unwrap().total, amt("80"));

        let both = SummaryArgs {
            range: Some("3m".to_string()),
            from: Some("2024-01-01".to_string()),
            to: None,
        };
        let err = expense_summary(env.config(), &user.id, both)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);

        let all = SummaryArgs {
            range: Some("all".to_string()),
            ..Default::default()
        };
        let out = expense_summary(env.config(), &user.id, all).await.unwrap();
        assert_eq!(out.structure().unwrap().total, amt("100"));
    }

    #[tokio::test]
    async fn test_summary_empty() {
        let env = TestEnv::new().await;
        let user = env.insert_user("a@b.c").await;
        let out = expense_summary(env.config(), &user.id, SummaryArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap(), &ExpenseSummary::default());
        assert_eq!(out.message(), "No expenses in this period");

        let err = user_summary(env.config(), "nobody@b.c", SummaryArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
    }
}
