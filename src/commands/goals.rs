use crate::args::{NewGoalArgs, PurchaseGoalArgs, UpdateGoalArgs};
use crate::commands::{count, Ack, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Goal, GoalPatch, GoalStatus, GoalView};
use crate::{Config, Error, Result};
use chrono::Utc;
use tracing::{debug, info};

fn not_found() -> Error {
    Error::msg(ErrorType::NotFound, "Goal not found")
}

fn item_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::msg(ErrorType::Request, "Item name required"));
    }
    Ok(name.to_string())
}

fn amount(value: Amount, what: &str) -> Result<Amount> {
    value.validate(what).pub_result(ErrorType::Request)
}

/// Lists the caller's goals, newest first, each with its progress.
pub async fn list_goals(config: Config, user_id: &str) -> Result<Out<Vec<GoalView>>> {
    let goals: Vec<GoalView> = config
        .db()
        .goals(user_id)
        .await
        .pub_result(ErrorType::Database)?
        .into_iter()
        .map(GoalView::from)
        .collect();
    Ok(Out::new(
        format!("Found {}", count(goals.len(), "goal", "goals")),
        goals,
    ))
}

/// Creates an active goal. The saved amount defaults to zero.
///
/// # Errors
/// - `Request` for a blank item name or an amount that is negative, has fractions of a cent or
///   is one trillion and up
pub async fn create_goal(
    config: Config,
    user_id: &str,
    args: NewGoalArgs,
) -> Result<Out<GoalView>> {
    let name = item_name(&args.item_name)?;
    let target = amount(args.target_price, "target price")?;
    let saved = amount(args.saved_amount.unwrap_or_default(), "saved amount")?;
    let goal = Goal::new(user_id, name, target, saved);
    config
        .db()
        .insert_goal(&goal)
        .await
        .pub_result(ErrorType::Database)?;
    debug!("Created goal {} for {user_id}", goal.id);
    Ok(Out::new(
        format!("Saving for {}", goal.item_name),
        GoalView::from(goal),
    ))
}

pub async fn update_goal(
    config: Config,
    user_id: &str,
    id: &str,
    args: UpdateGoalArgs,
) -> Result<Out<GoalView>> {
    let patch = GoalPatch {
        item_name: args.item_name.as_deref().map(item_name).transpose()?,
        target_price: args
            .target_price
            .map(|a| amount(a, "target price"))
            .transpose()?,
        saved_amount: args
            .saved_amount
            .map(|a| amount(a, "saved amount"))
            .transpose()?,
        status: args.status,
    };

    let db = config.db();
    let mut goal = db
        .goal(user_id, id)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(not_found)?;
    patch.apply(&mut goal);
    if !db.update_goal(&goal).await.pub_result(ErrorType::Database)? {
        return Err(not_found());
    }
    Ok(Out::new(format!("Updated goal {id}"), GoalView::from(goal)))
}

pub async fn delete_goal(config: Config, user_id: &str, id: &str) -> Result<Out<Ack>> {
    if !config
        .db()
        .delete_goal(user_id, id)
        .await
        .pub_result(ErrorType::Database)?
    {
        return Err(not_found());
    }
    Ok(Out::new(format!("Deleted goal {id}"), Ack::OK))
}

/// Marks a fully funded goal as purchased, recording the price paid and the date.
///
/// # Errors
/// - `Request` "Invalid purchase price" for a price outside the accepted amounts
/// - `Request` if the goal is already purchased or not yet fully funded
/// - `NotFound` "Goal not found"
pub async fn purchase_goal(
    config: Config,
    user_id: &str,
    id: &str,
    args: PurchaseGoalArgs,
) -> Result<Out<GoalView>> {
    let price = amount(args.purchase_price, "purchase price")?;
    let db = config.db();
    let mut goal = db
        .goal(user_id, id)
        .await
        .pub_result(ErrorType::Database)?
        .ok_or_else(not_found)?;

    if goal.status == GoalStatus::Purchased {
        return Err(Error::msg(
            ErrorType::Request,
            format!("{} has already been purchased", goal.item_name),
        ));
    }
    let progress = goal.progress();
    if !progress.fully_funded {
        return Err(Error::msg(
            ErrorType::Request,
            format!(
                "{} is not fully funded yet, {} to go",
                goal.item_name, progress.remaining
            ),
        ));
    }

    goal.status = GoalStatus::Purchased;
    goal.purchase_price = Some(price);
    goal.purchased_at = Some(args.purchased_at.unwrap_or_else(|| Utc::now().date_naive()));
    goal.updated_at = Utc::now();
    if !db.update_goal(&goal).await.pub_result(ErrorType::Database)? {
        return Err(not_found());
    }
    info!("Goal {id} purchased for {price}");
    Ok(Out::new(
        format!("Purchased {} for {price}", goal.item_name),
        GoalView::from(goal),
    ))
}
