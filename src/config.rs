//! Configuration file handling for edufin.
//!
//! The configuration file is stored at `$EDUFIN_HOME/config.json` and holds the server settings
//! and optional paths. The token-signing secret lives next to it in `.secrets/` and the
//! database in `edufin.sqlite`.

use crate::db::Db;
use crate::utils;
use anyhow::{bail, ensure, Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "edufin";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const BAGS: &str = "bags";
const TOKEN_SECRET: &str = "token_secret";
const CONFIG_JSON: &str = "config.json";
const EDUFIN_SQLITE: &str = "edufin.sqlite";
const RESOURCES_JSON: &str = "resources.json";
const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TOKEN_TTL_DAYS: u32 = 7;
const SECRET_LEN: usize = 64;

/// The configuration of the app. It is instantiated from the path to `$EDUFIN_HOME` and from
/// there loads `$EDUFIN_HOME/config.json`, the token secret and the database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
    token_secret: String,
}

impl Config {
    /// Creates the home directory and:
    /// - writes an initial `config.json` with default settings
    /// - generates a random token-signing secret in `.secrets/`
    /// - creates the SQLite database at the current schema version
    ///
    /// # Errors
    /// - Returns an error if the directory already holds a database or any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the edufin home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!("'{}' is already an edufin home", root.display());
        }

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        let token_secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_LEN)
            .map(char::from)
            .collect();
        utils::write(secrets.join(TOKEN_SECRET), &token_secret).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(EDUFIN_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            db,
            sqlite_path,
            token_secret,
        })
    }

    /// This will
    /// - validate that `edufin_home` and its config file exist
    /// - load and validate the config file
    /// - read the token secret
    /// - open the database, migrating it if needed
    pub async fn load(edufin_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = edufin_home.into();
        if !maybe_relative.is_dir() {
            bail!("Edufin home is missing '{}'", maybe_relative.display());
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let secrets = root.join(SECRETS);
        let secret_path = secrets.join(TOKEN_SECRET);
        if !secret_path.is_file() {
            bail!("The token secret is missing '{}'", secret_path.display())
        }
        let token_secret = utils::read(&secret_path).await?.trim().to_string();
        ensure!(
            !token_secret.is_empty(),
            "The token secret at '{}' is empty",
            secret_path.display()
        );

        let sqlite_path = root.join(EDUFIN_SQLITE);
        let db = Db::open(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            db,
            sqlite_path,
            token_secret,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn bind(&self) -> &str {
        &self.config_file.bind
    }

    pub fn port(&self) -> u16 {
        self.config_file.port
    }

    pub fn token_ttl_days(&self) -> u32 {
        self.config_file.token_ttl_days
    }

    pub(crate) fn token_secret(&self) -> &str {
        &self.token_secret
    }

    /// The resources file. A relative `resources_path` is resolved against the home directory.
    pub fn resources_path(&self) -> PathBuf {
        match &self.config_file.resources_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.root.join(p),
            None => self.root.join(RESOURCES_JSON),
        }
    }

    /// Where the command line keeps tip bags.
    pub fn bags_dir(&self) -> PathBuf {
        self.root.join(BAGS)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "edufin",
///   "config_version": 1,
///   "bind": "127.0.0.1",
///   "port": 5000,
///   "token_ttl_days": 7,
///   "resources_path": "content/resources.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "edufin"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    bind: String,

    #[serde(default = "default_port")]
    port: u16,

    /// How long an issued bearer token stays valid
    #[serde(default = "default_token_ttl_days")]
    token_ttl_days: u32,

    /// Path to the resources JSON file (optional, relative to the home directory or absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resources_path: Option<PathBuf>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_token_ttl_days() -> u32 {
    DEFAULT_TOKEN_TTL_DAYS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            bind: default_bind(),
            port: DEFAULT_PORT,
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            resources_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads and validates a config file.
    async fn load(path: &Path) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version <= CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected at most {}",
            config.config_version,
            CONFIG_VERSION
        );
        ensure!(config.token_ttl_days > 0, "token_ttl_days must be at least 1");

        Ok(config)
    }

    async fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("edufin_home");

        let config = Config::create(&home).await.unwrap();

        assert_eq!(config.port(), 5000);
        assert_eq!(config.bind(), "127.0.0.1");
        assert_eq!(config.token_ttl_days(), 7);
        assert_eq!(config.token_secret().len(), SECRET_LEN);
        assert!(config.secrets().is_dir());
        assert!(config.sqlite_path().is_file());
        assert!(config.config_path().is_file());
        assert_eq!(config.resources_path(), config.root().join(RESOURCES_JSON));
        assert_eq!(config.bags_dir(), config.root().join(BAGS));
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path()).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.token_secret(), loaded.token_secret());
        assert_eq!(created.config_file, loaded.config_file);
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        assert!(Config::create(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(err.to_string().contains("Edufin home is missing"));
    }

    #[tokio::test]
    async fn test_load_missing_secret() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();
        tokio::fs::remove_file(config.secrets().join(TOKEN_SECRET))
            .await
            .unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("token secret is missing"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(&path, r#"{"app_name": "edufin", "config_version": 1}"#)
            .await
            .unwrap();

        let config = ConfigFile::load(&path).await.unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(&path, r#"{"app_name": "budgeter", "config_version": 1}"#)
            .await
            .unwrap();

        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_resources_path_resolution() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path()).await.unwrap();
        config.config_file.resources_path = Some(PathBuf::from("content/r.json"));
        assert_eq!(config.resources_path(), config.root().join("content/r.json"));

        let absolute = dir.path().join("elsewhere.json");
        config.config_file.resources_path = Some(absolute.clone());
        assert_eq!(config.resources_path(), absolute);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("resources_path"));
        assert!(json.contains("\"port\":5000"));
    }
}
