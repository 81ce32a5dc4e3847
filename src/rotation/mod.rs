//! Tip rotation: show every tip once, in random order, before any tip repeats.
//!
//! The bag itself is a plain value (see [`Bag`]); [`TipRotation`] is the per-session controller
//! that loads it from a [`BagStore`], reconciles it with the current tip set, draws from it and
//! saves it back after every change so a restart resumes mid-cycle.
//!
//! Two sessions of the same user racing on one key can lose an update; the last save wins.

mod bag;
mod store;

pub use bag::{draw, ensure_bag, Bag};
#[cfg(test)]
pub(crate) use store::memory::MemoryBagStore;
pub use store::{BagStore, FileBagStore};

use crate::model::Tip;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

/// How far through the current cycle the user is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub seen: usize,
    pub total: usize,
}

impl Progress {
    /// True once every tip of the cycle has been shown.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.seen == self.total
    }
}

/// The result of asking for the next tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTip {
    /// `None` when there are no tips at all.
    pub tip: Option<Tip>,
    pub progress: Progress,
}

impl NextTip {
    pub fn is_unavailable(&self) -> bool {
        self.tip.is_none()
    }
}

/// Drives one user's bag through a `BagStore`.
pub struct TipRotation<'a, S: ?Sized> {
    store: &'a S,
    key: String,
}

impl<'a, S> TipRotation<'a, S>
where
    S: BagStore + ?Sized,
{
    pub fn new(store: &'a S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Draws the next tip, reshuffling when the cycle is over, and saves the bag.
    pub async fn next(&self, tips: &[Tip]) -> Result<NextTip> {
        let mut rng = StdRng::from_entropy();
        self.next_with(tips, &mut rng).await
    }

    pub async fn next_with<R>(&self, tips: &[Tip], rng: &mut R) -> Result<NextTip>
    where
        R: Rng + Send + ?Sized,
    {
        if tips.is_empty() {
            debug!("No tips to rotate for '{}'", self.key);
            return Ok(NextTip {
                tip: None,
                progress: Progress::default(),
            });
        }

        let ids = tip_ids(tips);
        let stored = self.store.load(&self.key).await?;
        let bag = ensure_bag(&ids, stored, rng);
        let (next, bag) = draw(bag);
        self.store.save(&self.key, &bag).await?;

        let tip = next.and_then(|id| tips.iter().find(|t| t.id == id).cloned());
        let progress = Progress {
            seen: tips.len() - bag.unseen(&ids),
            total: tips.len(),
        };
        debug!(
            "Drew tip {:?} for '{}' ({}/{})",
            tip.as_ref().map(|t| t.id.as_str()),
            self.key,
            progress.seen,
            progress.total
        );
        Ok(NextTip { tip, progress })
    }

    /// Reports progress without drawing or reshuffling.
    pub async fn progress(&self, tips: &[Tip]) -> Result<Progress> {
        let ids = tip_ids(tips);
        let unseen = match self.store.load(&self.key).await? {
            Some(bag) => bag.unseen(&ids),
            None => ids.len(),
        };
        Ok(Progress {
            seen: ids.len() - unseen,
            total: ids.len(),
        })
    }
}

/// Prefix of every bag's storage key.
const BAG_KEY: &str = "edufin_tip_bag_v1";

/// The storage key for the bag of `owner`: a user id on the server, a session name in the CLI.
pub fn bag_key(owner: &str) -> String {
    format!("{BAG_KEY}:{owner}")
}

fn tip_ids(tips: &[Tip]) -> Vec<String> {
    tips.iter().map(|t| t.id.clone()).collect()
}
