//! Flat, tombstone-based sequence CRDT.
//!
//! Every element carries an immutable [`NodeId`] and remembers the id of the
//! element it was inserted after. All elements live in one flat vector kept
//! in document order; removal only marks a node as deleted, so identity and
//! placement stay deterministic for every later merge.
//!
//! Ordering rule: elements that share a parent are kept in *descending* id
//! order. A node is placed right after its parent, skipping every node with a
//! greater id. Because a replica's clock always moves past every id it has
//! seen, descendants carry greater ids than their ancestors, and the scan
//! can never step out of the parent's subtree. Concurrent inserts at the same
//! position therefore end up in the same order on every replica, whatever
//! order the merges arrive in.
//!
//! There is no move operation. A move expressed as remove + insert is not
//! merge-safe: two replicas moving the same element concurrently end up with
//! two copies.

use crate::Mergable;
use serde::{Deserialize, Serialize};
use tandem_types::{Error, NodeId, Result, SiteId};

/// An element in the flat sequence, live or tombstoned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Node<T> {
    /// The element this one was inserted after (`None` for the front).
    parent: Option<NodeId>,
    /// The element's unique ID.
    id: NodeId,
    value: T,
    /// Tombstone flag; set once, never cleared.
    #[serde(default)]
    deleted: bool,
}

/// A flat, tombstoned, ordered-sequence CRDT.
///
/// Logical indices passed to [`insert`](Self::insert), [`remove`](Self::remove)
/// and [`get`](Self::get) only count visible (non-deleted) elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LSeq<T> {
    /// The site ID for this replica.
    site: SiteId,
    /// All nodes in document order, tombstones included.
    nodes: Vec<Node<T>>,
    /// Next logical time this replica will stamp on a new node.
    clock: u64,
}

impl<T> LSeq<T> {
    /// Creates an empty sequence owned by `site`.
    #[must_use]
    pub fn new(site: SiteId) -> Self {
        Self {
            site,
            nodes: Vec::new(),
            clock: 0,
        }
    }

    /// Returns the site ID for this replica.
    #[must_use]
    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Returns the logical time the next local insert will use.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Returns an iterator over the visible elements, in order.
    ///
    /// The iterator is recomputed from the node list on every call.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.nodes.iter(),
        }
    }

    /// Returns the number of visible (non-deleted) elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if no visible element remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Returns the total number of stored nodes, tombstones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the element at the given visible index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.iter().nth(index)
    }

    /// Returns a mutable reference to the element at the given visible index.
    ///
    /// In-place edits only converge across replicas if the element type's
    /// own merge resolves them, e.g. when the element is an [`LWW`](crate::LWW).
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let pos = self.position_of_visible(index)?;
        Some(&mut self.nodes[pos].value)
    }

    /// Returns the NodeId of the element at a visible index.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<&NodeId> {
        self.position_of_visible(index).map(|pos| &self.nodes[pos].id)
    }

    /// Returns the visible index of a NodeId, if it exists and is not deleted.
    #[must_use]
    pub fn index_of(&self, target: &NodeId) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.deleted)
            .position(|n| &n.id == target)
    }

    /// Returns whether a NodeId exists (even if tombstoned).
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    /// Returns whether a NodeId is tombstoned.
    #[must_use]
    pub fn is_tombstoned(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id && n.deleted)
    }

    /// Marks the element at the given visible index as deleted.
    ///
    /// Returns the ID of the tombstoned node.
    pub fn remove(&mut self, at: usize) -> Result<NodeId> {
        let pos = self
            .position_of_visible(at)
            .ok_or_else(|| self.out_of_bounds(at))?;
        let node = &mut self.nodes[pos];
        node.deleted = true;
        Ok(node.id.clone())
    }

    /// Maps a visible index to its slot in the node vector.
    fn position_of_visible(&self, index: usize) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.deleted)
            .nth(index)
            .map(|(pos, _)| pos)
    }

    fn out_of_bounds(&self, index: usize) -> Error {
        Error::IndexOutOfBounds {
            index,
            len: self.len(),
        }
    }

    /// Finds the slot a node not yet present must occupy.
    ///
    /// Starts right after the parent and stops before the first node with a
    /// smaller id. A parent that is not present places the node at the front.
    fn placement(&self, node: &Node<T>) -> usize {
        let start = node
            .parent
            .as_ref()
            .and_then(|parent| self.nodes.iter().position(|n| &n.id == parent))
            .map_or(0, |pos| pos + 1);

        self.nodes[start..]
            .iter()
            .position(|existing| existing.id < node.id)
            .map_or(self.nodes.len(), |offset| start + offset)
    }
}

impl<T: Mergable> LSeq<T> {
    /// Inserts `value` so that it becomes the element at visible index `at`.
    ///
    /// Returns the ID minted for the new element.
    pub fn insert(&mut self, value: T, at: usize) -> Result<NodeId> {
        let parent = match at {
            0 => None,
            _ => Some(
                self.id_at(at - 1)
                    .cloned()
                    .ok_or_else(|| self.out_of_bounds(at))?,
            ),
        };
        let id = NodeId::new(self.clock, self.site.clone());
        self.integrate(Node {
            parent,
            id: id.clone(),
            value,
            deleted: false,
        });
        Ok(id)
    }

    /// Appends `value` after the last visible element.
    pub fn push(&mut self, value: T) -> NodeId {
        let parent = self.nodes.iter().rev().find(|n| !n.deleted).map(|n| n.id.clone());
        let id = NodeId::new(self.clock, self.site.clone());
        self.integrate(Node {
            parent,
            id: id.clone(),
            value,
            deleted: false,
        });
        id
    }

    /// Folds one node into the sequence.
    ///
    /// A known id merges deletion flags and values; an unknown id is placed
    /// and moves the local clock past it.
    fn integrate(&mut self, node: Node<T>) {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            existing.deleted |= node.deleted;
            existing.value.merge(&node.value);
            return;
        }

        self.clock = self.clock.max(node.id.time.saturating_add(1));
        let at = self.placement(&node);
        self.nodes.insert(at, node);
    }
}

impl<T: Clone> LSeq<T> {
    /// Returns the visible elements as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Mergable> Mergable for LSeq<T> {
    /// Integrates every node of `other` in its document order, so parents
    /// always land before their children.
    fn merge(&mut self, other: &Self) {
        for node in &other.nodes {
            self.integrate(node.clone());
        }
    }
}

impl<T: PartialEq> PartialEq for LSeq<T> {
    fn eq(&self, other: &Self) -> bool {
        // Replica metadata (site, clock) is not part of the shared state.
        self.nodes == other.nodes
    }
}

impl<T: Eq> Eq for LSeq<T> {}

/// Iterator over the visible elements of an [`LSeq`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    inner: std::slice::Iter<'a, Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find(|n| !n.deleted).map(|n| &n.value)
    }
}

impl<'a, T> IntoIterator for &'a LSeq<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
