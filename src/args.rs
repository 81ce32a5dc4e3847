//! These structs provide the CLI interface for edufin and the request records accepted by the
//! HTTP server.
//!
//! Request records reject unknown fields so that a misspelled field is reported instead of
//! silently ignored.

use crate::model::{Amount, ExpenseCategory, GoalStatus, QuizAnswer};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// edufin: a personal-finance-education service.
///
/// Serves saving tips (shown in a shuffled rotation so that none repeats before all have been
/// seen), a need-or-want quiz, savings goals, expense tracking with summaries, and a list of
/// learning resources over a small REST API backed by SQLite.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file, the token secret and the database.
    ///
    /// This is the first command to run. By default the data directory is $HOME/edufin; pass
    /// --edufin-home or set EDUFIN_HOME to put it somewhere else.
    Init,
    /// Run the REST API server.
    Serve(ServeArgs),
    /// Load the demo tips, quiz items, demo user and a starter resources file.
    Seed,
    /// Draw tips from the rotation on the command line.
    Tip(TipArgs),
    /// Savings calculators.
    Calc(CalcArgs),
    /// Print the expense summary for a user.
    Summary(SummaryCliArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where edufin data and configuration is held. Defaults to ~/edufin
    #[arg(long, env = "EDUFIN_HOME", default_value_t = default_edufin_home())]
    edufin_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, edufin_home: PathBuf) -> Self {
        Self {
            log_level,
            edufin_home: edufin_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn edufin_home(&self) -> &DisplayPath {
        &self.edufin_home
    }
}

/// Args for the `edufin serve` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ServeArgs {
    /// The port to listen on. Overrides the port in config.json.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

impl ServeArgs {
    pub fn new(port: Option<u16>) -> Self {
        Self { port }
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Args for the `edufin tip` command.
#[derive(Debug, Parser, Clone)]
pub struct TipArgs {
    #[command(subcommand)]
    action: TipAction,

    /// Whose rotation to advance. Each name keeps its own bag.
    #[arg(long, default_value = "cli")]
    session: String,
}

impl TipArgs {
    pub fn new(action: TipAction, session: impl Into<String>) -> Self {
        Self {
            action,
            session: session.into(),
        }
    }

    pub fn action(&self) -> TipAction {
        self.action
    }

    pub fn session(&self) -> &str {
        &self.session
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipAction {
    /// Show the next tip of the rotation.
    Next,
    /// Show how many tips of the current cycle have been seen.
    Progress,
}

/// Args for the `edufin calc` command.
#[derive(Debug, Parser, Clone)]
pub struct CalcArgs {
    #[command(subcommand)]
    calculator: Calculator,
}

impl CalcArgs {
    pub fn new(calculator: Calculator) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Calculator {
    /// How much to save per day to reach a target in a number of days.
    DailyTarget {
        /// The amount to reach, e.g. 250 or $1,200.00
        #[arg(long)]
        target: Amount,
        #[arg(long)]
        days: u32,
    },
    /// How long it takes to reach a target saving a fixed amount per day.
    Duration {
        #[arg(long)]
        target: Amount,
        /// The amount saved every day.
        #[arg(long)]
        daily: Amount,
    },
}

/// Args for the `edufin summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryCliArgs {
    /// The user's email address.
    #[arg(long)]
    email: String,

    #[clap(flatten)]
    window: SummaryArgs,
}

impl SummaryCliArgs {
    pub fn new(email: impl Into<String>, window: SummaryArgs) -> Self {
        Self {
            email: email.into(),
            window,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn window(&self) -> &SummaryArgs {
        &self.window
    }
}

/// The date window of a summary: either a `range` preset or explicit `from`/`to` bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryArgs {
    /// One of 1m, 3m, 12m, all.
    #[arg(long)]
    pub range: Option<String>,

    /// Inclusive start date, YYYY-MM-DD.
    #[arg(long)]
    pub from: Option<String>,

    /// Exclusive end date, YYYY-MM-DD.
    #[arg(long)]
    pub to: Option<String>,
}

// Request records

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterArgs {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginArgs {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Query of `GET /api/expenses`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListExpensesArgs {
    pub from: Option<String>,
    pub to: Option<String>,
    /// 1-based, default 1.
    pub page: Option<u32>,
    /// Clamped to 1..=200, default 50.
    pub limit: Option<u32>,
}

/// Body of `POST /api/expenses`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewExpenseArgs {
    pub amount: Amount,
    #[serde(default)]
    pub category: Option<ExpenseCategory>,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of `PATCH /api/expenses/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateExpenseArgs {
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub category: Option<ExpenseCategory>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of `POST /api/goals`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewGoalArgs {
    pub item_name: String,
    pub target_price: Amount,
    #[serde(default)]
    pub saved_amount: Option<Amount>,
}

/// Body of `PATCH /api/goals/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateGoalArgs {
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub target_price: Option<Amount>,
    #[serde(default)]
    pub saved_amount: Option<Amount>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
}

/// Body of `POST /api/goals/:id/purchase`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PurchaseGoalArgs {
    pub purchase_price: Amount,
    /// Defaults to today.
    #[serde(default)]
    pub purchased_at: Option<NaiveDate>,
}

/// Body of `POST /api/quiz/score`: the chosen answer per quiz item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreQuizArgs {
    pub answers: BTreeMap<String, QuizAnswer>,
}

fn default_edufin_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("edufin"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --edufin-home or EDUFIN_HOME instead of relying on the default \
                edufin home directory.",
            );
            PathBuf::from("edufin")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
