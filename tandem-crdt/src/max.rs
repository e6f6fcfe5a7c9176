//! Max register: tracks the largest value any replica has seen.

use crate::Mergable;
use serde::{Deserialize, Serialize};

/// Holds the maximum of a totally ordered value.
///
/// Merge keeps the larger of the two values, which makes it the simplest
/// possible join and the building block for [`GCounter`](crate::GCounter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Max<V> {
    /// The current maximum.
    pub value: V,
}

impl<V> Max<V> {
    /// Creates a register holding `value`.
    #[must_use]
    pub const fn new(value: V) -> Self {
        Self { value }
    }

    /// Returns a reference to the current maximum.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the register and returns its value.
    #[must_use]
    pub fn into_inner(self) -> V {
        self.value
    }
}

impl<V: Ord + Clone> Mergable for Max<V> {
    fn merge(&mut self, other: &Self) {
        if other.value > self.value {
            self.value = other.value.clone();
        }
    }
}

impl<V> From<V> for Max<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}
