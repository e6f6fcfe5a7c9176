//! Session ownership of one replicated value.
//!
//! A [`Session`] is the single logical owner of a CRDT replica. Local edits
//! and inbound merges both go through `&mut self`, so the replica never needs
//! a lock. The session only touches the network through a [`Transport`].
//!
//! Lifecycle:
//! 1. **Start**: the session holds a fresh replica stamped with a new site id
//! 2. **Edit**: local changes are applied, then the full state is broadcast
//! 3. **Join**: newly joined participants receive a full snapshot
//! 4. **Receive**: inbound states are decoded and merged
//! 5. **Invalidate**: the state is discarded until [`Session::rejoin`]

use crate::codec;
use crate::error::{SyncError, SyncResult};
use crate::transport::{Recipients, Transport, TransportEvent};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tandem_crdt::Mergable;
use tandem_types::{ParticipantId, SiteId};
use tracing::{debug, info, warn};

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name used to identify this participant in logs.
    pub display_name: String,
    /// Broadcast the full state after every local edit.
    pub broadcast_on_edit: bool,
    /// Send the full state to participants as they join.
    pub snapshot_on_join: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_name: "Tandem Participant".to_string(),
            broadcast_on_edit: true,
            snapshot_on_join: true,
        }
    }
}

/// What handling one transport event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// An inbound state was merged into the replica.
    Merged { from: ParticipantId },
    /// An inbound payload was discarded (undecodable, or no active state).
    Dropped { from: ParticipantId },
    /// Participants joined; `snapshot_sent` tells whether they got our state.
    Joined {
        participants: Vec<ParticipantId>,
        snapshot_sent: bool,
    },
    /// The group session ended and the replica was discarded.
    Invalidated,
}

/// The owner of one replica in a group session.
pub struct Session<T, X> {
    config: SessionConfig,
    transport: X,
    site: SiteId,
    state: Option<T>,
    /// Every site id this session has stamped edits with.
    used_sites: HashSet<SiteId>,
}

impl<T, X> Session<T, X>
where
    T: Mergable + Serialize + DeserializeOwned + Send + Sync,
    X: Transport,
{
    /// Starts a session around `state`, whose local edits are stamped with `site`.
    pub fn new(transport: X, site: SiteId, state: T, config: SessionConfig) -> Self {
        info!(
            name = %config.display_name,
            participant = %transport.local_participant(),
            site = %site,
            "session started"
        );
        let mut used_sites = HashSet::new();
        used_sites.insert(site.clone());
        Self {
            config,
            transport,
            site,
            state: Some(state),
            used_sites,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the site id of the current replica.
    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Returns the local participant ID.
    pub fn participant(&self) -> ParticipantId {
        self.transport.local_participant()
    }

    /// Returns the replica, or `None` after invalidation.
    pub fn state(&self) -> Option<&T> {
        self.state.as_ref()
    }

    /// Returns whether the session currently holds a replica.
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &X {
        &self.transport
    }

    /// Returns the underlying transport mutably.
    pub fn transport_mut(&mut self) -> &mut X {
        &mut self.transport
    }

    /// Applies a local edit and, if configured, broadcasts the new state.
    ///
    /// Only fails if the session is not active. Once applied, the edit
    /// stands even if the broadcast fails; the next publish or join snapshot
    /// carries it to the other participants.
    pub async fn edit<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> SyncResult<R> {
        let state = self.state.as_mut().ok_or(SyncError::NotActive)?;
        let result = f(state);
        if self.config.broadcast_on_edit {
            if let Err(e) = self.publish().await {
                warn!(error = %e, "failed to broadcast edit");
            }
        }
        Ok(result)
    }

    /// Broadcasts the full state to every other participant.
    pub async fn publish(&self) -> SyncResult<()> {
        self.send_state(Recipients::All).await
    }

    async fn send_state(&self, to: Recipients) -> SyncResult<()> {
        let state = self.state.as_ref().ok_or(SyncError::NotActive)?;
        let payload = codec::encode(state)?;
        debug!(bytes = payload.len(), recipients = ?to, "sending state");
        self.transport.send(payload, to).await
    }

    /// Reacts to one transport event.
    pub async fn handle_event(&mut self, event: TransportEvent) -> SyncResult<SessionUpdate> {
        match event {
            TransportEvent::Received { from, payload } => Ok(self.receive(from, &payload)),
            TransportEvent::ParticipantsJoined(participants) => {
                info!(count = participants.len(), "participants joined");
                let mut snapshot_sent = self.config.snapshot_on_join && self.is_active();
                if snapshot_sent {
                    if let Err(e) = self
                        .send_state(Recipients::Only(participants.clone()))
                        .await
                    {
                        warn!(error = %e, "failed to send snapshot to joined participants");
                        snapshot_sent = false;
                    }
                }
                Ok(SessionUpdate::Joined {
                    participants,
                    snapshot_sent,
                })
            }
            TransportEvent::Invalidated => {
                info!(site = %self.site, "session invalidated, discarding state");
                self.state = None;
                Ok(SessionUpdate::Invalidated)
            }
        }
    }

    fn receive(&mut self, from: ParticipantId, payload: &[u8]) -> SessionUpdate {
        let Some(state) = self.state.as_mut() else {
            debug!(from = %from, "dropping payload for inactive session");
            return SessionUpdate::Dropped { from };
        };
        match codec::decode::<T>(payload) {
            Ok(remote) => {
                state.merge(&remote);
                debug!(from = %from, bytes = payload.len(), "merged remote state");
                SessionUpdate::Merged { from }
            }
            Err(e) => {
                warn!(from = %from, error = %e, "dropping undecodable payload");
                SessionUpdate::Dropped { from }
            }
        }
    }

    /// Waits for the next transport event and handles it.
    /// Returns `None` once the transport shuts down.
    pub async fn next(&mut self) -> SyncResult<Option<SessionUpdate>> {
        match self.transport.next_event().await {
            Some(event) => self.handle_event(event).await.map(Some),
            None => Ok(None),
        }
    }

    /// Handles events until the session is invalidated or the transport
    /// shuts down.
    pub async fn run(&mut self) -> SyncResult<()> {
        while let Some(update) = self.next().await? {
            if update == SessionUpdate::Invalidated {
                break;
            }
        }
        Ok(())
    }

    /// Starts over with a fresh replica after invalidation.
    ///
    /// Fails with [`SyncError::AlreadyActive`] while the current replica is
    /// live. `site` must differ from every site id this session used before;
    /// a reused id would let new edits collide with ones already delivered.
    pub fn rejoin(&mut self, site: SiteId, state: T) -> SyncResult<()> {
        if self.is_active() {
            return Err(SyncError::AlreadyActive);
        }
        if self.used_sites.contains(&site) {
            return Err(SyncError::SiteReused(site));
        }
        info!(site = %site, previous = %self.site, "session rejoined");
        self.used_sites.insert(site.clone());
        self.site = site;
        self.state = Some(state);
        Ok(())
    }
}
