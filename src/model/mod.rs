//! Types that represent the core data model, such as `Expense`, `Goal` and `Tip`.
mod amount;
mod expense;
mod goal;
mod quiz;
mod resource;
mod tip;
mod user;

pub use amount::{Amount, AmountError};
pub use expense::{Expense, ExpenseCategory, ExpensePatch};
pub use goal::{Goal, GoalPatch, GoalProgress, GoalStatus, GoalView};
pub use quiz::{QuizAnswer, QuizItem};
pub use resource::Resource;
pub use tip::Tip;
pub use user::{normalize_email, User};
