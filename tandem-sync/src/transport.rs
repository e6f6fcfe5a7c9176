//! Transport layer abstraction.
//!
//! A session only needs to push opaque payloads to other participants and
//! observe what happens on the shared channel. Delivery is assumed to be
//! at-least-once: payloads may arrive duplicated, reordered or not at all,
//! which the replicated types tolerate by construction.

use crate::error::SyncResult;
use async_trait::async_trait;
use tandem_types::ParticipantId;

/// Who a payload is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// Every other participant in the session.
    All,
    /// A specific subset of participants.
    Only(Vec<ParticipantId>),
}

/// Something observed on the shared channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A payload sent by another participant.
    Received {
        from: ParticipantId,
        payload: Vec<u8>,
    },
    /// Participants that were not in the session before.
    ParticipantsJoined(Vec<ParticipantId>),
    /// The group session ended; all replicated state must be discarded.
    Invalidated,
}

/// A channel that connects the participants of one group session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the local participant ID.
    fn local_participant(&self) -> ParticipantId;

    /// Sends a payload to the given participants.
    async fn send(&self, payload: Vec<u8>, to: Recipients) -> SyncResult<()>;

    /// Receives the next event.
    /// Returns `None` once the channel is shut down.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

/// An in-process transport for tests and local demos.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::{RwLock, mpsc};
    use tracing::debug;

    type Members = HashMap<ParticipantId, mpsc::UnboundedSender<TransportEvent>>;

    /// A shared group channel that participants join.
    ///
    /// Cloning the hub yields another handle to the same group.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryHub {
        members: Arc<RwLock<Members>>,
    }

    impl MemoryHub {
        /// Creates an empty group.
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a participant. Existing members are told about the newcomer,
        /// and the newcomer is told about everyone already present.
        pub async fn join(&self) -> MemoryTransport {
            let id = ParticipantId::new();
            let (tx, rx) = mpsc::unbounded_channel();

            let mut members = self.members.write().await;
            let existing: Vec<ParticipantId> = members.keys().copied().collect();
            for (member, sender) in members.iter() {
                if sender
                    .send(TransportEvent::ParticipantsJoined(vec![id]))
                    .is_err()
                {
                    debug!(participant = %member, "skipping closed inbox");
                }
            }
            if !existing.is_empty() && tx.send(TransportEvent::ParticipantsJoined(existing)).is_err() {
                debug!(participant = %id, "skipping closed inbox");
            }
            members.insert(id, tx);
            debug!(participant = %id, members = members.len(), "participant joined hub");

            MemoryTransport {
                id,
                hub: self.clone(),
                inbox: rx,
            }
        }

        /// Ends the group session for every member.
        pub async fn invalidate(&self) {
            let members = self.members.read().await;
            for (member, sender) in members.iter() {
                if sender.send(TransportEvent::Invalidated).is_err() {
                    debug!(participant = %member, "skipping closed inbox");
                }
            }
        }

        /// Removes a participant; its inbox closes once drained.
        pub async fn leave(&self, id: ParticipantId) {
            self.members.write().await.remove(&id);
        }

        /// Returns the current member IDs.
        pub async fn participants(&self) -> Vec<ParticipantId> {
            self.members.read().await.keys().copied().collect()
        }
    }

    /// One participant's end of a [`MemoryHub`].
    ///
    /// Payloads addressed to participants that left, or never joined, are
    /// skipped rather than failing the send.
    #[derive(Debug)]
    pub struct MemoryTransport {
        id: ParticipantId,
        hub: MemoryHub,
        inbox: mpsc::UnboundedReceiver<TransportEvent>,
    }

    impl MemoryTransport {
        /// Returns the hub this transport belongs to.
        pub fn hub(&self) -> &MemoryHub {
            &self.hub
        }

        /// Returns the next event if one is already queued.
        pub fn try_next_event(&mut self) -> Option<TransportEvent> {
            self.inbox.try_recv().ok()
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        fn local_participant(&self) -> ParticipantId {
            self.id
        }

        async fn send(&self, payload: Vec<u8>, to: Recipients) -> SyncResult<()> {
            let members = self.hub.members.read().await;
            match to {
                Recipients::All => {
                    for (id, sender) in members.iter().filter(|(id, _)| **id != self.id) {
                        let event = TransportEvent::Received {
                            from: self.id,
                            payload: payload.clone(),
                        };
                        if sender.send(event).is_err() {
                            debug!(participant = %id, "skipping closed inbox");
                        }
                    }
                }
                Recipients::Only(ids) => {
                    for id in ids {
                        let Some(sender) = members.get(&id) else {
                            debug!(participant = %id, "skipping unknown participant");
                            continue;
                        };
                        let event = TransportEvent::Received {
                            from: self.id,
                            payload: payload.clone(),
                        };
                        if sender.send(event).is_err() {
                            debug!(participant = %id, "skipping closed inbox");
                        }
                    }
                }
            }
            Ok(())
        }

        async fn next_event(&mut self) -> Option<TransportEvent> {
            self.inbox.recv().await
        }
    }
}
