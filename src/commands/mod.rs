//! Command handlers.
//!
//! Every operation of the application is a function here. The CLI and the HTTP server both call
//! these and only differ in how they present the returned `Out`.

mod auth;
mod calc;
mod expenses;
mod goals;
mod init;
mod quiz;
mod resources;
mod seed;
mod serve;
mod tips;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use auth::{login, me, register, Session};
pub use calc::{daily_target, duration};
pub use expenses::{
    create_expense, delete_expense, expense_summary, list_expenses, update_expense, user_summary,
};
pub use goals::{create_goal, delete_goal, list_goals, purchase_goal, update_goal};
pub use init::init;
pub use quiz::{list_quiz, score_quiz, QuizScore};
pub use resources::list_resources;
pub use seed::{seed, SeedReport, DEMO_EMAIL, DEMO_PASSWORD};
pub use serve::serve;
pub use tips::{list_tips, next_tip, tip_progress};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and the HTTP server.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Takes the structured data out, leaving the message behind.
    pub fn into_structure(self) -> Option<T> {
        self.structure
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// The structured result of a command whose only outcome is success, e.g. a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}

/// "1 expense", "2 expenses"
pub(crate) fn count(n: usize, singular: &str, plural: &str) -> String {
    format!("{n} {}", if n == 1 { singular } else { plural })
}
