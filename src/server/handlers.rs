//! One handler per route. Each unpacks the request, calls the matching command and returns the
//! command's structured output as the JSON body.

use crate::args::{
    ListExpensesArgs, LoginArgs, NewExpenseArgs, NewGoalArgs, PurchaseGoalArgs, RegisterArgs,
    ScoreQuizArgs, SummaryArgs, UpdateExpenseArgs, UpdateGoalArgs,
};
use crate::commands::{self, Ack, Out, QuizScore, Session};
use crate::error::ErrorType;
use crate::model::{Expense, GoalView, QuizItem, Resource, Tip, User};
use crate::resources::ResourceQuery;
use crate::rotation::{bag_key, NextTip, Progress};
use crate::server::extract::{AuthUser, JsonBody, QueryParams};
use crate::server::AppState;
use crate::summary::ExpenseSummary;
use crate::{Error, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::fmt::Debug;

type Reply<T> = Result<Json<T>>;
type Created<T> = Result<(StatusCode, Json<T>)>;

fn reply<T>(out: Out<T>) -> Reply<T>
where
    T: Serialize + Clone + Debug,
{
    let message = out.message().to_string();
    out.into_structure()
        .map(Json)
        .ok_or_else(|| Error::msg(ErrorType::Internal, format!("No data to return: {message}")))
}

fn created<T>(out: Out<T>) -> Created<T>
where
    T: Serialize + Clone + Debug,
{
    reply(out).map(|json| (StatusCode::CREATED, json))
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UserBody {
    user: User,
}

pub(crate) async fn health() -> Json<Ack> {
    Json(Ack::OK)
}

// auth

pub(crate) async fn register(
    State(state): State<AppState>,
    JsonBody(args): JsonBody<RegisterArgs>,
) -> Created<Session> {
    created(commands::register(state.config, args).await?)
}

pub(crate) async fn login(
    State(state): State<AppState>,
    JsonBody(args): JsonBody<LoginArgs>,
) -> Reply<Session> {
    reply(commands::login(state.config, args).await?)
}

pub(crate) async fn me(State(state): State<AppState>, user: AuthUser) -> Reply<UserBody> {
    let user = reply(commands::me(state.config, &user.id).await?)?.0;
    Ok(Json(UserBody { user }))
}

// tips

pub(crate) async fn list_tips(State(state): State<AppState>) -> Reply<Vec<Tip>> {
    reply(commands::list_tips(state.config).await?)
}

pub(crate) async fn next_tip(State(state): State<AppState>, user: AuthUser) -> Reply<NextTip> {
    let db = state.config.db().clone();
    reply(commands::next_tip(state.config, &db, &bag_key(&user.id)).await?)
}

pub(crate) async fn tip_progress(State(state): State<AppState>, user: AuthUser) -> Reply<Progress> {
    let db = state.config.db().clone();
    reply(commands::tip_progress(state.config, &db, &bag_key(&user.id)).await?)
}

// quiz

pub(crate) async fn list_quiz(State(state): State<AppState>) -> Reply<Vec<QuizItem>> {
    reply(commands::list_quiz(state.config).await?)
}

pub(crate) async fn score_quiz(
    State(state): State<AppState>,
    JsonBody(args): JsonBody<ScoreQuizArgs>,
) -> Reply<QuizScore> {
    reply(commands::score_quiz(state.config, args).await?)
}

// goals

pub(crate) async fn list_goals(
    State(state): State<AppState>,
    user: AuthUser,
) -> Reply<Vec<GoalView>> {
    reply(commands::list_goals(state.config, &user.id).await?)
}

pub(crate) async fn create_goal(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(args): JsonBody<NewGoalArgs>,
) -> Created<GoalView> {
    created(commands::create_goal(state.config, &user.id, args).await?)
}

pub(crate) async fn update_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(args): JsonBody<UpdateGoalArgs>,
) -> Reply<GoalView> {
    reply(commands::update_goal(state.config, &user.id, &id, args).await?)
}

pub(crate) async fn delete_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Reply<Ack> {
    reply(commands::delete_goal(state.config, &user.id, &id).await?)
}

pub(crate) async fn purchase_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(args): JsonBody<PurchaseGoalArgs>,
) -> Reply<GoalView> {
    reply(commands::purchase_goal(state.config, &user.id, &id, args).await?)
}

// expenses

pub(crate) async fn list_expenses(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(args): QueryParams<ListExpensesArgs>,
) -> Reply<Vec<Expense>> {
    reply(commands::list_expenses(state.config, &user.id, args).await?)
}

pub(crate) async fn create_expense(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(args): JsonBody<NewExpenseArgs>,
) -> Created<Expense> {
    created(commands::create_expense(state.config, &user.id, args).await?)
}

pub(crate) async fn update_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(args): JsonBody<UpdateExpenseArgs>,
) -> Reply<Expense> {
    reply(commands::update_expense(state.config, &user.id, &id, args).await?)
}

pub(crate) async fn delete_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Reply<Ack> {
    reply(commands::delete_expense(state.config, &user.id, &id).await?)
}

pub(crate) async fn expense_summary(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(args): QueryParams<SummaryArgs>,
) -> Reply<ExpenseSummary> {
    reply(commands::expense_summary(state.config, &user.id, args).await?)
}

// resources

pub(crate) async fn list_resources(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ResourceQuery>,
) -> Reply<Vec<Resource>> {
    reply(commands::list_resources(&state.catalog, query).await?)
}
