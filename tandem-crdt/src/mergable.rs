//! The common merge contract shared by every type in this crate.

use std::collections::HashMap;
use std::hash::Hash;

/// A value that can absorb the state of another replica of itself.
///
/// Implementations must make `merge` a join:
/// - Associative: `a.merged(&b.merged(&c)) == a.merged(&b).merged(&c)`
/// - Commutative: `a.merged(&b) == b.merged(&a)`
/// - Idempotent: `a.merged(&a) == a`
///
/// Merging never fails. Any two well-formed values of the same type can be
/// merged no matter how far their histories diverged.
pub trait Mergable: Clone {
    /// Folds `other` into `self`, leaving `self` at the join of both states.
    fn merge(&mut self, other: &Self);

    /// Returns a new value that is the merge of this and another.
    #[must_use]
    fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }
}

/// Key-wise union; values present on both sides are merged.
impl<K, V> Mergable for HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Mergable,
{
    fn merge(&mut self, other: &Self) {
        for (key, value) in other {
            match self.get_mut(key) {
                Some(existing) => existing.merge(value),
                None => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

// Plain values join on their natural order, so they can sit directly inside
// a sequence without a wrapper.
macro_rules! mergable_by_max {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Mergable for $ty {
                fn merge(&mut self, other: &Self) {
                    if *other > *self {
                        *self = other.clone();
                    }
                }
            }
        )*
    };
}

mergable_by_max!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, String,
);
