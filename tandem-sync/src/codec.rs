//! JSON wire codec for replicated values.
//!
//! Transports only move opaque bytes; the session encodes its whole state
//! with [`encode`] and merges whatever [`decode`] hands back.

use crate::error::{SyncError, SyncResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Maximum encoded payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Serializes a value to a JSON payload.
pub fn encode<T: Serialize>(value: &T) -> SyncResult<Vec<u8>> {
    let data = serde_json::to_vec(value)?;
    if data.len() > MAX_PAYLOAD_SIZE {
        return Err(SyncError::PayloadTooLarge { size: data.len() });
    }
    Ok(data)
}

/// Deserializes a JSON payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> SyncResult<T> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(SyncError::PayloadTooLarge {
            size: payload.len(),
        });
    }
    Ok(serde_json::from_slice(payload)?)
}
