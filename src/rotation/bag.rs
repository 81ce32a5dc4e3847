//! The tip bag: a shuffled working set of not-yet-shown tip identifiers.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The ids left to show in the current cycle, plus the membership of the tip set the cycle was
/// built from.
///
/// Invariants:
/// - `remaining` has no duplicates.
/// - every id in `remaining` is in `members`.
///
/// Draws are taken from the back of `remaining`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    remaining: Vec<String>,
    members: BTreeSet<String>,
}

impl Bag {
    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// The number of tips in the set this bag was built from.
    pub fn cycle_size(&self) -> usize {
        self.members.len()
    }

    /// How many of `tip_ids` have not been shown in this cycle: those still in the bag plus
    /// those that joined the tip set after the bag was built.
    pub fn unseen(&self, tip_ids: &[String]) -> usize {
        let current: BTreeSet<&String> = tip_ids.iter().collect();
        let in_bag: BTreeSet<&String> = self
            .remaining
            .iter()
            .filter(|id| current.contains(id))
            .collect();
        let known = if self.members.is_empty() {
            in_bag.clone()
        } else {
            self.members.iter().collect()
        };
        let added = current.iter().filter(|id| !known.contains(*id)).count();
        in_bag.len() + added
    }
}

/// Reconciles a stored bag with the current tip set.
///
/// - ids that are no longer in `tip_ids` are dropped,
/// - ids that joined the tip set since the bag was built are inserted at random positions,
/// - if nothing remains, a fresh uniformly random permutation of `tip_ids` is returned.
///
/// An empty tip set always yields an empty bag.
pub fn ensure_bag<R>(tip_ids: &[String], stored: Option<Bag>, rng: &mut R) -> Bag
where
    R: Rng + ?Sized,
{
    let current: BTreeSet<String> = tip_ids.iter().cloned().collect();
    if current.is_empty() {
        return Bag::default();
    }

    let stored = stored.unwrap_or_default();
    let mut seen = BTreeSet::new();
    let mut remaining: Vec<String> = stored
        .remaining
        .into_iter()
        .filter(|id| current.contains(id) && seen.insert(id.clone()))
        .collect();

    // A bag written before membership was recorded has an empty snapshot; treat its ids as the
    // snapshot so nothing is re-added mid-cycle.
    let known = if stored.members.is_empty() {
        seen
    } else {
        stored.members
    };

    if !remaining.is_empty() {
        for id in current.iter().filter(|id| !known.contains(*id)) {
            let at = rng.gen_range(0..=remaining.len());
            remaining.insert(at, id.clone());
        }
    }

    if remaining.is_empty() {
        return shuffled(current, rng);
    }

    Bag {
        remaining,
        members: current,
    }
}

fn shuffled<R>(members: BTreeSet<String>, rng: &mut R) -> Bag
where
    R: Rng + ?Sized,
{
    let mut remaining: Vec<String> = members.iter().cloned().collect();
    remaining.shuffle(rng);
    Bag { remaining, members }
}

/// Takes the next id off the back of the bag. Returns `None` and an empty bag once the bag is
/// exhausted.
pub fn draw(mut bag: Bag) -> (Option<String>, Bag) {
    let next = bag.remaining.pop();
    (next, bag)
}
