//! Operation-log replay for ordered lists.
//!
//! Instead of merging a structure incrementally, every local edit is recorded
//! as an immutable [`ModificationMessage`]. The visible list is rebuilt from
//! scratch by folding the whole *set* of known messages, sorted by
//! `(order, client)`, over an empty list. Replicas holding the same message
//! set therefore compute the same list, whatever order the messages arrived in.
//!
//! Moves and removals whose indices are no longer valid at replay time (a
//! concurrent edit changed the list under them) are skipped and reported in
//! [`Replay::skipped`].

use crate::Mergable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use tandem_types::SiteId;

/// One list edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationOperation<T> {
    /// Push an item at the end of the list.
    Append(T),
    /// Move the item at `source` so it lands before the item currently at
    /// `destination`; `destination == len` moves it to the end.
    Move { source: usize, destination: usize },
    /// Remove the item at the index.
    Remove(usize),
}

/// A logged edit, stamped with its author and position in the replay order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModificationMessage<T> {
    /// The replica that recorded the edit.
    pub client: SiteId,
    /// Number of messages the client knew of when recording. Strictly
    /// increasing per client.
    pub order: u64,
    pub operation: ModificationOperation<T>,
}

/// Result of replaying a message set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay<T> {
    /// The rebuilt list.
    pub items: Vec<T>,
    /// Moves and removals whose indices were invalid when their turn came.
    pub skipped: Vec<ModificationMessage<T>>,
}

/// A grow-only set of list edits with deterministic replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Eq + Hash",
    deserialize = "T: Deserialize<'de> + Eq + Hash"
))]
pub struct ModificationLog<T> {
    client: SiteId,
    messages: HashSet<ModificationMessage<T>>,
}

impl<T: Clone + Eq + Hash> ModificationLog<T> {
    /// Creates an empty log for the replica `client`.
    #[must_use]
    pub fn new(client: SiteId) -> Self {
        Self {
            client,
            messages: HashSet::new(),
        }
    }

    /// Returns the replica that records into this log.
    #[must_use]
    pub fn client(&self) -> &SiteId {
        &self.client
    }

    /// Records an append and returns the message to broadcast.
    pub fn append(&mut self, item: T) -> ModificationMessage<T> {
        self.record(ModificationOperation::Append(item))
    }

    /// Records a move and returns the message to broadcast.
    pub fn move_item(&mut self, source: usize, destination: usize) -> ModificationMessage<T> {
        self.record(ModificationOperation::Move {
            source,
            destination,
        })
    }

    /// Records a removal and returns the message to broadcast.
    pub fn remove(&mut self, index: usize) -> ModificationMessage<T> {
        self.record(ModificationOperation::Remove(index))
    }

    fn record(&mut self, operation: ModificationOperation<T>) -> ModificationMessage<T> {
        let message = ModificationMessage {
            client: self.client.clone(),
            order: self.messages.len() as u64,
            operation,
        };
        self.messages.insert(message.clone());
        message
    }

    /// Adds an inbound message. Returns false if it was already known.
    pub fn receive(&mut self, message: ModificationMessage<T>) -> bool {
        self.messages.insert(message)
    }

    /// Returns the known messages in replay order.
    #[must_use]
    pub fn messages(&self) -> Vec<&ModificationMessage<T>> {
        let mut sorted: Vec<_> = self.messages.iter().collect();
        sorted.sort_by(|a, b| (a.order, &a.client).cmp(&(b.order, &b.client)));
        sorted
    }

    /// Returns the number of known messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Rebuilds the list from the full message set.
    #[must_use]
    pub fn replay(&self) -> Replay<T> {
        let mut items = Vec::new();
        let mut skipped = Vec::new();

        for message in self.messages() {
            let applied = match &message.operation {
                ModificationOperation::Append(item) => {
                    items.push(item.clone());
                    true
                }
                ModificationOperation::Move {
                    source,
                    destination,
                } => move_within(&mut items, *source, *destination),
                ModificationOperation::Remove(index) => {
                    if *index < items.len() {
                        items.remove(*index);
                        true
                    } else {
                        false
                    }
                }
            };
            if !applied {
                skipped.push(message.clone());
            }
        }

        Replay { items, skipped }
    }

    /// Returns the current list.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.replay().items
    }
}

/// Moves `items[source]` before the element at offset `destination`.
fn move_within<T>(items: &mut Vec<T>, source: usize, destination: usize) -> bool {
    if source >= items.len() || destination > items.len() {
        return false;
    }
    let item = items.remove(source);
    let target = if destination > source {
        destination - 1
    } else {
        destination
    };
    items.insert(target, item);
    true
}

impl<T: Clone + Eq + Hash> Mergable for ModificationLog<T> {
    /// Set union. A full log doubles as the snapshot handed to a replica
    /// that joins late.
    fn merge(&mut self, other: &Self) {
        self.messages.extend(other.messages.iter().cloned());
    }
}

impl<T: Eq + Hash> PartialEq for ModificationLog<T> {
    fn eq(&self, other: &Self) -> bool {
        self.messages == other.messages
    }
}

impl<T: Eq + Hash> Eq for ModificationLog<T> {}
