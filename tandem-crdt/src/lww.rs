//! Last-Writer-Wins Register (LWW-Register).
//!
//! A CRDT that stores a single value. Every local write bumps a logical
//! clock; concurrent writes are resolved by comparing clocks, and the site id
//! of the writer breaks ties.
//!
//! Use cases:
//! - Single-value properties (a list title, an item's checked state)
//! - Elements of a sequence that may be edited in place after insertion

use crate::Mergable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tandem_types::SiteId;

/// A Last-Writer-Wins Register.
///
/// Stores a value of type `V` along with the metadata needed for conflict
/// resolution. The write with the higher clock wins. On equal clocks, the
/// write made by the greater site id wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LWW<V> {
    /// The current value.
    value: V,
    /// Logical clock of the current value's write.
    clock: u64,
    /// Replica that owns this register and stamps local writes.
    site: SiteId,
    /// Replica whose write produced the current value.
    writer: SiteId,
}

impl<V> LWW<V> {
    /// Creates a register owned by `site`, holding `value` at clock 0.
    #[must_use]
    pub fn new(site: SiteId, value: V) -> Self {
        Self {
            value,
            clock: 0,
            writer: site.clone(),
            site,
        }
    }

    /// Creates a register with an explicit clock (for testing or replay).
    #[must_use]
    pub fn with_clock(site: SiteId, value: V, clock: u64) -> Self {
        Self {
            value,
            clock,
            writer: site.clone(),
            site,
        }
    }

    /// Returns a reference to the current value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the clock of the last write.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Returns the site that owns this replica.
    #[must_use]
    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Returns the site that performed the last write.
    #[must_use]
    pub fn writer(&self) -> &SiteId {
        &self.writer
    }

    /// Writes a new value, incrementing the clock.
    pub fn set(&mut self, value: V) {
        self.value = value;
        self.clock = self.clock.saturating_add(1);
        self.writer = self.site.clone();
    }

    /// Writes a new value on behalf of `writer`, incrementing the clock.
    ///
    /// Registers embedded in a shared structure are copied between replicas
    /// with their original owner, so the replica editing a copy stamps the
    /// write with its own site id.
    pub fn set_as(&mut self, writer: &SiteId, value: V) {
        self.value = value;
        self.clock = self.clock.saturating_add(1);
        self.writer = writer.clone();
    }

    /// Applies `f` to the value in place, counting as one local write.
    pub fn update(&mut self, f: impl FnOnce(&mut V)) {
        f(&mut self.value);
        self.clock = self.clock.saturating_add(1);
        self.writer = self.site.clone();
    }

    /// Determines if an incoming write should win over the current value.
    fn should_update(&self, clock: u64, writer: &SiteId) -> bool {
        match clock.cmp(&self.clock) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => *writer > self.writer,
        }
    }
}

impl<V: Clone> Mergable for LWW<V> {
    /// The value with the higher clock (or greater writer on a tie) wins.
    /// The owning site never changes.
    fn merge(&mut self, other: &Self) {
        if self.should_update(other.clock, &other.writer) {
            self.value = other.value.clone();
            self.clock = other.clock;
            self.writer = other.writer.clone();
        }
    }
}

impl<V: PartialEq> PartialEq for LWW<V> {
    fn eq(&self, other: &Self) -> bool {
        // Two registers are equal if they hold the same write
        self.value == other.value && self.clock == other.clock && self.writer == other.writer
    }
}

impl<V: Eq> Eq for LWW<V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str) -> SiteId {
        SiteId::from(name)
    }

    #[test]
    fn set_increments_clock() {
        let mut reg = LWW::new(site("a"), 1);
        assert_eq!(reg.clock(), 0);
        reg.set(2);
        reg.set(3);
        assert_eq!(*reg.value(), 3);
        assert_eq!(reg.clock(), 2);
    }

    #[test]
    fn update_counts_as_write() {
        let mut reg = LWW::new(site("a"), vec![1]);
        reg.update(|v| v.push(2));
        assert_eq!(reg.value(), &vec![1, 2]);
        assert_eq!(reg.clock(), 1);
    }

    #[test]
    fn higher_clock_wins_regardless_of_site() {
        let mut low_site = LWW::with_clock(site("a"), "newer", 5);
        let high_site = LWW::with_clock(site("z"), "older", 4);
        low_site.merge(&high_site);
        assert_eq!(*low_site.value(), "newer");

        let mut other = high_site.clone();
        other.merge(&LWW::with_clock(site("a"), "newer", 5));
        assert_eq!(*other.value(), "newer");
        assert_eq!(other.clock(), 5);
    }

    #[test]
    fn equal_clocks_resolve_to_greater_site() {
        let a = LWW::with_clock(site("a"), "from a", 3);
        let b = LWW::with_clock(site("b"), "from b", 3);
        assert_eq!(*a.merged(&b).value(), "from b");
        assert_eq!(*b.merged(&a).value(), "from b");
    }

    #[test]
    fn merge_adopts_writer_but_keeps_owner() {
        let mut a = LWW::new(site("a"), 0);
        let mut b = LWW::new(site("b"), 0);
        b.set(9);
        a.merge(&b);
        assert_eq!(a.site(), &site("a"));
        assert_eq!(a.writer(), &site("b"));

        a.set(10);
        assert_eq!(a.writer(), &site("a"));
        assert_eq!(a.clock(), 2);
        b.merge(&a);
        assert_eq!(*b.value(), 10);
    }

    #[test]
    fn three_way_tie_is_associative() {
        let a = LWW::with_clock(site("a"), 1, 1);
        let b = LWW::with_clock(site("b"), 2, 1);
        let ab = LWW::with_clock(site("ab"), 3, 1);
        let left = a.merged(&b).merged(&ab);
        let right = a.merged(&b.merged(&ab));
        assert_eq!(left, right);
        assert_eq!(*left.value(), 2);
    }

    #[test]
    fn set_as_stamps_the_editing_site() {
        let mut copy = LWW::new(site("a"), "draft");
        copy.set_as(&site("b"), "final");
        assert_eq!(copy.site(), &site("a"));
        assert_eq!(copy.writer(), &site("b"));
        assert_eq!(copy.clock(), 1);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut reg = LWW::new(site("a"), String::from("milk"));
        reg.set(String::from("oat milk"));
        let json = serde_json::to_string(&reg).unwrap();
        let parsed: LWW<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, reg);
        assert_eq!(parsed.site(), reg.site());
    }
}
