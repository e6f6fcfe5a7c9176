//! Identifier types used throughout the Tandem core.
//!
//! Site identifiers are plain strings so that any session layer can supply
//! them. Node identifiers pair a site with a logical clock reading and carry
//! the total order every sequence CRDT relies on.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifies one replica (one editing peer) within a collaborative session.
///
/// Site ids namespace a replica's contributions and break ties between
/// concurrent edits. They are injected into every CRDT by the owning session;
/// the data types never mint one themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Creates a site id from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh, globally unique site id.
    ///
    /// Intended for the session context that owns a replica, once per session.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SiteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Globally unique, immutable position identifier for a sequence element.
///
/// Ordered primarily by `time`. When two sites mint ids at the same logical
/// time, the one with the *smaller* site id sorts higher, so every replica
/// agrees on one total order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Logical clock reading of the creating site.
    pub time: u64,
    /// The site that created the element.
    pub site: SiteId,
}

impl NodeId {
    /// Creates a node id.
    #[must_use]
    pub fn new(time: u64, site: impl Into<SiteId>) -> Self {
        Self {
            time,
            site: site.into(),
        }
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            // Site ids compare descending on a clock tie.
            Ordering::Equal => other.site.cmp(&self.site),
            ord => ord,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.time, self.site)
    }
}

/// Identifies a participant of a collaborative session at the transport level.
///
/// Distinct from [`SiteId`]: a participant keeps its transport identity across
/// a rejoin while its replica gets a fresh site id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Creates a new random participant id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a participant id from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a participant id from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
