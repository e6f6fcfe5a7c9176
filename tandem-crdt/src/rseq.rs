//! Tree-structured sequence CRDT.
//!
//! Each element is a node in an explicit tree: inserting after an element
//! makes the new node that element's first child, and the document order is
//! a pre-order walk. Sibling lists are kept sorted by [`NodeId`] descending,
//! the same ordering argument [`LSeq`](crate::LSeq) applies to its flat list,
//! applied per level instead.
//!
//! Nodes live in an arena and refer to their children by index. There is no
//! delete operation; see [`LSeq`](crate::LSeq) for the tombstone technique.

use crate::Mergable;
use serde::{Deserialize, Serialize};
use std::fmt;
use tandem_types::{Error, NodeId, Result, SiteId};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node<T> {
    id: NodeId,
    value: T,
    /// Arena indices, sorted by id descending.
    children: Vec<usize>,
}

/// A nested-tree, ordered-sequence CRDT without deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RSeq<T> {
    site: SiteId,
    /// Node arena. Indices are stable for the lifetime of the value.
    nodes: Vec<Node<T>>,
    /// Root-level nodes, sorted by id descending.
    roots: Vec<usize>,
    clock: u64,
}

impl<T> RSeq<T> {
    /// Creates an empty sequence owned by `site`.
    #[must_use]
    pub fn new(site: SiteId) -> Self {
        Self {
            site,
            nodes: Vec::new(),
            roots: Vec::new(),
            clock: 0,
        }
    }

    #[must_use]
    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Highest logical time this replica has used or observed.
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Returns a lazy pre-order iterator over the elements.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            walk: self.preorder(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the element at the given index in document order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.iter().nth(index)
    }

    /// Inserts `value` so that it becomes the element at index `at`.
    ///
    /// Index 0 makes it the first root-level node; any other index makes it
    /// the first child of the element currently at `at - 1`.
    pub fn insert(&mut self, value: T, at: usize) -> Result<NodeId> {
        let parent = match at {
            0 => None,
            _ => Some(
                self.preorder()
                    .nth(at - 1)
                    .map(|(idx, _)| idx)
                    .ok_or(Error::IndexOutOfBounds {
                        index: at,
                        len: self.len(),
                    })?,
            ),
        };

        self.clock = self.clock.saturating_add(1);
        let id = NodeId::new(self.clock, self.site.clone());
        let idx = self.alloc(Node {
            id: id.clone(),
            value,
            children: Vec::new(),
        });

        match parent {
            None => self.roots.insert(0, idx),
            Some(parent) => self.nodes[parent].children.insert(0, idx),
        }
        Ok(id)
    }

    fn alloc(&mut self, node: Node<T>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn preorder(&self) -> Preorder<'_, T> {
        Preorder {
            nodes: &self.nodes,
            stack: self.roots.iter().rev().map(|&idx| (idx, 0)).collect(),
        }
    }

    fn siblings_mut(&mut self, parent: Option<usize>) -> &mut Vec<usize> {
        match parent {
            None => &mut self.roots,
            Some(idx) => &mut self.nodes[idx].children,
        }
    }

    fn sort_descending(&self, siblings: &mut [usize]) {
        siblings.sort_by(|&a, &b| self.nodes[b].id.cmp(&self.nodes[a].id));
    }
}

impl<T: Clone> RSeq<T> {
    /// Returns the elements as a vector, in document order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Copies the subtree rooted at `remote` in `other` into this arena.
    fn copy_subtree(&mut self, other: &Self, remote: usize) -> usize {
        let root = self.alloc(Node {
            id: other.nodes[remote].id.clone(),
            value: other.nodes[remote].value.clone(),
            children: Vec::new(),
        });

        let mut pending = vec![(remote, root)];
        while let Some((from, to)) = pending.pop() {
            for &child in &other.nodes[from].children {
                let copied = self.alloc(Node {
                    id: other.nodes[child].id.clone(),
                    value: other.nodes[child].value.clone(),
                    children: Vec::new(),
                });
                self.nodes[to].children.push(copied);
                pending.push((child, copied));
            }
        }
        root
    }
}

impl<T: Clone> Mergable for RSeq<T> {
    /// Merges sibling lists level by level, matching nodes by id. Unknown
    /// subtrees are copied over whole; every level touched is re-sorted.
    fn merge(&mut self, other: &Self) {
        let mut pending: Vec<(Option<usize>, Option<usize>)> = vec![(None, None)];

        while let Some((local, remote)) = pending.pop() {
            let remote_children = match remote {
                None => &other.roots,
                Some(idx) => &other.nodes[idx].children,
            };
            if remote_children.is_empty() {
                continue;
            }

            let mut siblings = std::mem::take(self.siblings_mut(local));
            for &r in remote_children {
                let known = siblings
                    .iter()
                    .copied()
                    .find(|&l| self.nodes[l].id == other.nodes[r].id);
                match known {
                    Some(l) => pending.push((Some(l), Some(r))),
                    None => {
                        let copied = self.copy_subtree(other, r);
                        siblings.push(copied);
                    }
                }
            }
            self.sort_descending(&mut siblings);
            *self.siblings_mut(local) = siblings;
        }

        self.clock = self.clock.max(other.clock);
    }
}

impl<T: fmt::Display> RSeq<T> {
    /// Renders the tree with two spaces of indentation per level.
    #[must_use]
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for (idx, depth) in self.preorder() {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&self.nodes[idx].value.to_string());
            out.push('\n');
        }
        out
    }
}

impl<T: PartialEq> PartialEq for RSeq<T> {
    fn eq(&self, other: &Self) -> bool {
        // Same tree shape and contents, independent of arena layout.
        self.len() == other.len()
            && self.preorder().zip(other.preorder()).all(|((a, da), (b, db))| {
                da == db
                    && self.nodes[a].id == other.nodes[b].id
                    && self.nodes[a].value == other.nodes[b].value
            })
    }
}

impl<T: Eq> Eq for RSeq<T> {}

/// Pre-order walk yielding `(arena index, depth)`.
struct Preorder<'a, T> {
    nodes: &'a [Node<T>],
    stack: Vec<(usize, usize)>,
}

impl<T> Iterator for Preorder<'_, T> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, depth) = self.stack.pop()?;
        self.stack
            .extend(self.nodes[idx].children.iter().rev().map(|&c| (c, depth + 1)));
        Some((idx, depth))
    }
}

/// Lazy pre-order iterator over the elements of an [`RSeq`].
pub struct Iter<'a, T> {
    walk: Preorder<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.walk.nodes;
        self.walk.next().map(|(idx, _)| &nodes[idx].value)
    }
}

impl<'a, T> IntoIterator for &'a RSeq<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(site: &str) -> RSeq<char> {
        RSeq::new(SiteId::from(site))
    }

    fn text(s: &RSeq<char>) -> String {
        s.iter().collect()
    }

    #[test]
    fn insert_after_nests_as_first_child() {
        let mut s = seq("siteA");
        s.insert('a', 0).unwrap();
        s.insert('b', 1).unwrap();
        s.insert('c', 1).unwrap();
        assert_eq!(s.to_vec(), vec!['a', 'c', 'b']);
    }

    #[test]
    fn insert_at_zero_prepends_root() {
        let mut s = seq("a");
        s.insert('b', 0).unwrap();
        s.insert('a', 0).unwrap();
        assert_eq!(text(&s), "ab");
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut s = seq("a");
        assert_eq!(
            s.insert('x', 1).unwrap_err(),
            Error::IndexOutOfBounds { index: 1, len: 0 }
        );
        assert!(s.is_empty());
        assert_eq!(s.clock(), 0);
    }

    #[test]
    fn pretty_indents_children() {
        let mut s = seq("a");
        s.insert('a', 0).unwrap();
        s.insert('b', 1).unwrap();
        s.insert('c', 1).unwrap();
        assert_eq!(s.pretty(), "a\n  c\n  b\n");
    }

    #[test]
    fn merge_into_empty_copies_everything() {
        let mut a = seq("siteA");
        a.insert('a', 0).unwrap();
        a.insert('b', 1).unwrap();
        let mut b = seq("siteB");
        b.merge(&a);
        assert_eq!(text(&a), text(&b));
        assert_eq!(b.clock(), a.clock());
        assert_eq!(a, b);
    }

    #[test]
    fn two_sites_converge() {
        let mut a = seq("siteA");
        a.insert('a', 0).unwrap();
        a.insert('b', 1).unwrap();
        let mut b = seq("siteB");
        b.merge(&a);

        a.insert('c', 2).unwrap();
        a.insert('d', 3).unwrap();
        b.insert('e', 2).unwrap();
        b.insert('f', 3).unwrap();

        assert_eq!(text(&a.merged(&b)), "abcdef");
        assert_eq!(text(&b.merged(&a)), "abcdef");
    }

    #[test]
    fn merge_is_idempotent() {
        let mut a = seq("a");
        a.insert('x', 0).unwrap();
        a.insert('y', 1).unwrap();
        assert_eq!(a.merged(&a), a);
    }

    #[test]
    fn insert_saturates_clock() {
        let mut s = seq("a");
        s.clock = u64::MAX;
        let id = s.insert('x', 0).unwrap();
        assert_eq!(id, NodeId::new(u64::MAX, "a"));
        assert_eq!(s.clock(), u64::MAX);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut s = seq("a");
        s.insert('a', 0).unwrap();
        s.insert('b', 1).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let parsed: RSeq<char> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
        assert_eq!(parsed.clock(), 2);
    }
}
