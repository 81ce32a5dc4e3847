//! The learning-resource catalog, read from a JSON file and cached for a few minutes.

use crate::model::Resource;
use crate::utils;
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// How long a loaded catalog is served before the file is read again.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 100;

/// Filters for listing resources. Text filters are case-insensitive; blank filters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceQuery {
    /// Matched as a substring of the title, summary or source.
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub language: Option<String>,
    /// Clamped to 1..=100, default 50.
    pub limit: Option<usize>,
}

impl ResourceQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

struct Cached {
    loaded_at: Instant,
    items: Arc<Vec<Resource>>,
}

/// Serves the resources file at `path`.
pub struct ResourceCatalog {
    path: PathBuf,
    ttl: Duration,
    cache: RwLock<Option<Cached>>,
}

impl ResourceCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, CACHE_TTL)
    }

    pub fn with_ttl(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Lists matching resources, pinned first then by title. An unreadable file yields an empty
    /// list and is retried on the next call.
    pub async fn list(&self, query: &ResourceQuery) -> Vec<Resource> {
        let items = self.items().await;
        let q = needle(&query.q);
        let category = needle(&query.category);
        let tag = needle(&query.tag);
        let language = needle(&query.language);

        items
            .iter()
            .filter(|r| {
                q.as_ref().map_or(true, |q| {
                    contains(Some(&r.title), q)
                        || contains(r.summary.as_ref(), q)
                        || contains(r.source.as_ref(), q)
                })
            })
            .filter(|r| category.as_ref().map_or(true, |c| equals(r.category.as_ref(), c)))
            .filter(|r| {
                tag.as_ref()
                    .map_or(true, |t| r.tags.iter().any(|x| x.to_lowercase() == *t))
            })
            .filter(|r| language.as_ref().map_or(true, |l| equals(r.language.as_ref(), l)))
            .take(query.limit())
            .cloned()
            .collect()
    }

    async fn items(&self) -> Arc<Vec<Resource>> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if !cached.items.is_empty() && cached.loaded_at.elapsed() <= self.ttl {
                return cached.items.clone();
            }
        }

        let mut guard = self.cache.write().await;
        match utils::deserialize::<Vec<Resource>>(&self.path).await {
            Ok(mut items) => {
                items.sort_by(pinned_then_title);
                debug!("Loaded {} resources from {}", items.len(), self.path.display());
                let items = Arc::new(items);
                *guard = Some(Cached {
                    loaded_at: Instant::now(),
                    items: items.clone(),
                });
                items
            }
            Err(e) => {
                warn!("Unable to load resources: {e:#}");
                Arc::new(Vec::new())
            }
        }
    }
}

fn pinned_then_title(a: &Resource, b: &Resource) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

fn needle(filter: &Option<String>) -> Option<String> {
    filter
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

fn contains(field: Option<&String>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

fn equals(field: Option<&String>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase() == needle)
}
