//! Session layer for Tandem replicas.
//!
//! Connects one replicated value from `tandem-crdt` to a group channel.
//!
//! # Architecture
//!
//! The replicated types converge under any delivery order, so the session
//! layer stays thin: no handshakes, no acknowledgements, no retries.
//!
//! ## Components
//!
//! - **Codec**: Encodes replicas to JSON payloads and back
//! - **Transport**: Abstracts over the channel shared by participants
//! - **Session**: Owns the replica, broadcasts edits and merges inbound state
//!
//! ## Session Flow
//!
//! 1. **Start**: Create the replica with a fresh site id
//! 2. **Edit**: Apply local changes and broadcast the full state
//! 3. **Join**: Send a snapshot to every newly joined participant
//! 4. **Merge**: Fold every inbound state into the local replica
//! 5. **Invalidate**: Drop the replica; rejoin with a new site id
//!
//! # Example
//!
//! ```
//! use tandem_crdt::{LSeq, SiteId};
//! use tandem_sync::transport::memory::MemoryHub;
//! use tandem_sync::{Session, SessionConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hub = MemoryHub::new();
//! let site = SiteId::random();
//! let transport = hub.join().await;
//! let mut session = Session::new(
//!     transport,
//!     site.clone(),
//!     LSeq::<char>::new(site),
//!     SessionConfig::default(),
//! );
//! session.edit(|list| list.push('x')).await.unwrap();
//! assert_eq!(session.state().unwrap().to_vec(), vec!['x']);
//! # }
//! ```

pub mod codec;
mod error;
mod session;
pub mod transport;

pub use error::{SyncError, SyncResult};
pub use session::{Session, SessionConfig, SessionUpdate};
pub use transport::{Recipients, Transport, TransportEvent};
