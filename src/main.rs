use clap::Parser;
use edufin::args::{Args, Calculator, Command, TipAction};
use edufin::rotation::{bag_key, FileBagStore};
use edufin::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with {} error: {}", e.error_type(), e.chain());
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().edufin_home().path();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Serve(serve_args) => {
            let config = Config::load(home).await?;
            commands::serve(config, serve_args.clone()).await?.print()
        }

        Command::Seed => commands::seed(Config::load(home).await?).await?.print(),

        Command::Tip(tip_args) => {
            let config = Config::load(home).await?;
            let store = FileBagStore::new(config.bags_dir());
            let key = bag_key(tip_args.session());
            match tip_args.action() {
                TipAction::Next => commands::next_tip(config, &store, &key).await?.print(),
                TipAction::Progress => commands::tip_progress(config, &store, &key)
                    .await?
                    .print(),
            }
        }

        Command::Calc(calc_args) => match calc_args.calculator() {
            Calculator::DailyTarget { target, days } => {
                commands::daily_target(*target, *days)?.print()
            }
            Calculator::Duration { target, daily } => {
                commands::duration(*target, *daily)?.print()
            }
        },

        Command::Summary(summary_args) => {
            let config = Config::load(home).await?;
            commands::user_summary(
                config,
                summary_args.email(),
                summary_args.window().clone(),
            )
            .await?
            .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
