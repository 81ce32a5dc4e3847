use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and:
/// - an initial `config.json` with default settings
/// - a random token-signing secret in `.secrets/`
/// - the SQLite database
///
/// # Arguments
/// - `edufin_home` - The directory that will be the root of the data directory, e.g.
///   `$HOME/edufin`
///
/// # Errors
/// - Returns an error if the directory is already initialized or any file operation fails.
pub async fn init(edufin_home: &Path) -> Result<Out<()>> {
    let config = Config::create(edufin_home)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the edufin directory at {}",
        config.root().display()
    )
    .into())
}
