//! Where bags are kept between requests.

use crate::db::Db;
use crate::rotation::Bag;
use crate::utils;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Loads and saves bags by string key. Failures are returned to the caller as-is.
#[async_trait::async_trait]
pub trait BagStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Bag>>;
    async fn save(&self, key: &str, bag: &Bag) -> Result<()>;
}

/// Keeps bags in the database's key-value table, one row per key.
#[async_trait::async_trait]
impl BagStore for Db {
    async fn load(&self, key: &str) -> Result<Option<Bag>> {
        let Some(raw) = self.get_value(key).await? else {
            return Ok(None);
        };
        Ok(parse_or_discard(key, &raw))
    }

    async fn save(&self, key: &str, bag: &Bag) -> Result<()> {
        let raw = serde_json::to_string(bag).context("Unable to serialize tip bag")?;
        self.set_value(key, &raw).await
    }
}

/// Keeps each bag in its own JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileBagStore {
    dir: PathBuf,
}

impl FileBagStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// ASCII letters, digits and `-` are kept; every other byte of the key becomes `_` and two
    /// hex digits, so distinct keys never share a file.
    fn path(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for b in key.bytes() {
            if b.is_ascii_alphanumeric() || b == b'-' {
                file.push(char::from(b));
            } else {
                file.push_str(&format!("_{b:02x}"));
            }
        }
        self.dir.join(format!("{file}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl BagStore for FileBagStore {
    async fn load(&self, key: &str) -> Result<Option<Bag>> {
        let path = self.path(key);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = utils::read(&path).await?;
        Ok(parse_or_discard(key, &raw))
    }

    async fn save(&self, key: &str, bag: &Bag) -> Result<()> {
        utils::make_dir(&self.dir).await?;
        utils::serialize(&self.path(key), bag).await
    }
}

/// An unreadable stored bag is treated like a missing one; it gets rebuilt on the next draw.
fn parse_or_discard(key: &str, raw: &str) -> Option<Bag> {
    match serde_json::from_str(raw) {
        Ok(bag) => Some(bag),
        Err(e) => {
            warn!("Discarding unreadable tip bag '{key}': {e}");
            None
        }
    }
}
