//! Links between the server and its clients
//!
//! Each client/server pair is joined by two [`LaggedChannel`]s, one per
//! direction. The server owns the inbound input channel and hands a clone to
//! every client at connect time; each client owns its snapshot channel and
//! the server keeps a clone of it.

use crate::SettingsHandle;
use lagsim_core::{Clock, EntityId, Input, LaggedChannel, WorldState};

/// Client-to-server direction
pub type InputChannel<C> = LaggedChannel<Input, C>;

/// Server-to-client direction
pub type SnapshotChannel<C> = LaggedChannel<WorldState, C>;

/// A client's view of its connection
#[derive(Debug)]
pub enum Connection<C: Clock> {
    /// Not yet connected to a server
    NotConnected,
    /// Connected and assigned an entity
    Connected {
        /// Entity the server created for this client
        entity_id: EntityId,
        /// Where this client's inputs go
        uplink: InputChannel<C>,
    },
}

impl<C: Clock> Connection<C> {
    /// Entity assigned by the server, if connected
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Connection::NotConnected => None,
            Connection::Connected { entity_id, .. } => Some(*entity_id),
        }
    }

    /// Check if the server has assigned an entity
    pub fn is_connected(&self) -> bool {
        matches!(self, Connection::Connected { .. })
    }
}

/// The server's view of one connected client
#[derive(Debug, Clone)]
pub struct ClientLink<C: Clock> {
    /// Name of the client, for logs
    pub name: String,
    /// Entity owned by this client
    pub entity_id: EntityId,
    /// Where snapshots for this client go
    pub downlink: SnapshotChannel<C>,
    /// Live settings; the lag decides the broadcast delay
    pub settings: SettingsHandle,
}
