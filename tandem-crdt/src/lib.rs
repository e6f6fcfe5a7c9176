//! Replicated data types for Tandem.
//!
//! This crate provides Conflict-free Replicated Data Types for collaborative
//! sessions without a coordinator:
//!
//! - [`Mergable`]: the merge contract every type below implements
//! - [`Max<V>`]: maximum of a totally ordered value
//! - [`GCounter<V>`]: grow-only counter with one entry per site
//! - [`LWW<V>`]: last-writer-wins register
//! - [`LSeq<T>`]: flat, tombstoned ordered sequence
//! - [`RSeq<T>`]: tree-structured ordered sequence without deletion
//! - [`ModificationLog<T>`]: ordered list rebuilt by replaying an edit log
//!
//! All types in this crate satisfy the following properties:
//! - **Commutative**: merge(a, b) == merge(b, a)
//! - **Associative**: merge(merge(a, b), c) == merge(a, merge(b, c))
//! - **Idempotent**: merge(a, a) == a
//!
//! These properties ensure that replicas will converge to the same state
//! regardless of the order, duplication or partial delivery of updates.
//! Every type is `Serialize`/`Deserialize` so it can cross the wire as an
//! opaque payload.

mod gcounter;
pub mod lseq;
mod lww;
mod max;
mod mergable;
mod modification_log;
pub mod rseq;

pub use gcounter::GCounter;
pub use lseq::LSeq;
pub use lww::LWW;
pub use max::Max;
pub use mergable::Mergable;
pub use modification_log::{ModificationLog, ModificationMessage, ModificationOperation, Replay};
pub use rseq::RSeq;
pub use tandem_types::{NodeId, SiteId};
