//! Grow-only Counter CRDT.
//!
//! A G-Counter keeps one [`Max`] entry per site. Each site only ever raises
//! its own entry, so merging is an entry-wise max and the counter value is the
//! sum of all entries.
//!
//! Satisfies commutativity, associativity, and idempotency for merge.

use crate::{Max, Mergable};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::{Add, AddAssign};
use tandem_types::SiteId;

/// A Grow-only Counter CRDT.
///
/// `V::default()` is taken as zero. Increments must be non-negative; a
/// negative delta is a programming error and panics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GCounter<V> {
    storage: HashMap<SiteId, Max<V>>,
    site: SiteId,
}

impl<V> GCounter<V>
where
    V: Ord + Clone + Default + Add<Output = V>,
{
    /// Creates a counter owned by `site`, starting at `initial`.
    #[must_use]
    pub fn new(site: SiteId, initial: V) -> Self {
        let mut storage = HashMap::new();
        storage.insert(site.clone(), Max::new(initial));
        Self { storage, site }
    }

    /// Returns the site that owns this replica.
    #[must_use]
    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Adds `delta` to this replica's own entry.
    ///
    /// # Panics
    ///
    /// Panics if `delta` is negative. A grow-only counter cannot be
    /// decremented; callers must never construct a decrementing delta.
    pub fn increment(&mut self, delta: V) {
        assert!(delta >= V::default(), "GCounter cannot be decremented");
        let entry = self
            .storage
            .entry(self.site.clone())
            .or_insert_with(|| Max::new(V::default()));
        entry.value = entry.value.clone() + delta;
    }

    /// Returns the current counter value, summed over every site.
    #[must_use]
    pub fn value(&self) -> V {
        self.storage
            .values()
            .fold(V::default(), |acc, entry| acc + entry.value.clone())
    }

    /// Returns the contribution recorded for `site` (zero if unknown).
    #[must_use]
    pub fn contribution(&self, site: &SiteId) -> V {
        self.storage
            .get(site)
            .map(|entry| entry.value.clone())
            .unwrap_or_default()
    }
}

impl<V: Ord + Clone> Mergable for GCounter<V> {
    /// Entry-wise max; the owning site is kept.
    fn merge(&mut self, other: &Self) {
        self.storage.merge(&other.storage);
    }
}

impl<V> AddAssign<V> for GCounter<V>
where
    V: Ord + Clone + Default + Add<Output = V>,
{
    fn add_assign(&mut self, delta: V) {
        self.increment(delta);
    }
}

impl<V> PartialEq for GCounter<V>
where
    V: Ord + Clone + Default,
{
    fn eq(&self, other: &Self) -> bool {
        // Equal when every site's entry matches; absent entries count as zero.
        let sites: HashSet<_> = self.storage.keys().chain(other.storage.keys()).collect();
        sites.into_iter().all(|site| {
            let mine = self.storage.get(site).map(|m| m.value.clone()).unwrap_or_default();
            let theirs = other.storage.get(site).map(|m| m.value.clone()).unwrap_or_default();
            mine == theirs
        })
    }
}

impl<V: Ord + Clone + Default> Eq for GCounter<V> {}
