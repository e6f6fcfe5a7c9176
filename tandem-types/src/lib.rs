//! Core type definitions for Tandem.
//!
//! This crate provides the foundational types shared by the CRDT and sync
//! crates:
//! - Site, node and participant identifiers
//! - The error type for index-addressed sequence operations

mod ids;

pub use ids::{NodeId, ParticipantId, SiteId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in local sequence operations.
///
/// Merging never fails; only index-addressed local edits can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}
