//! Error types for the session layer.

use tandem_types::SiteId;
use thiserror::Error;

/// Result type for session operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while running a session.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An encoded payload exceeds the wire limit.
    #[error("payload too large: {size} bytes")]
    PayloadTooLarge { size: usize },

    /// The transport failed to deliver a payload.
    #[error("transport error: {0}")]
    Transport(String),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,

    /// A rejoin tried to reuse a site identifier from an earlier session.
    #[error("site id already used in this session: {0}")]
    SiteReused(SiteId),

    /// A rejoin was attempted while the current replica is still live.
    #[error("session is still active")]
    AlreadyActive,

    /// The session was invalidated and has no state until it rejoins.
    #[error("session is not active")]
    NotActive,
}
