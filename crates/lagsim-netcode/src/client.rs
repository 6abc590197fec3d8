//! Client loop: prediction, reconciliation, and entity interpolation
//!
//! Each tick a client:
//! 1. Drains ready snapshots, adopting the authoritative position of its own
//!    entity (optionally replaying unacknowledged inputs) and mirroring every
//!    remote entity
//! 2. Optionally interpolates remote entities between the two latest snapshots
//! 3. Samples its controls and sends an input, optionally applying it locally
//!
//! The client's own entity and its remote mirrors are separately owned
//! copies; none of them aliases server state.

use crate::reconciliation::reconcile;
use crate::transport::{Connection, InputChannel, SnapshotChannel};
use crate::{Controls, InputSampler, Interpolator, PendingInputs, Result, SettingsHandle};
use indexmap::IndexMap;
use lagsim_core::{Actor, Clock, Entity, EntityId, LaggedChannel, TickRate};
use tracing::debug;

/// Lifecycle of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Not connected to a server
    Unbound,
    /// Connected, waiting for a snapshot that contains our entity
    AwaitingFirstSnapshot,
    /// Own entity exists; the full tick runs
    Active,
}

/// One player's view of the world
#[derive(Debug)]
pub struct Client<C: Clock> {
    name: String,
    clock: C,
    settings: SettingsHandle,
    connection: Connection<C>,
    inbound: SnapshotChannel<C>,
    /// Own entity, predicted and reconciled locally
    entity: Option<Entity>,
    /// Everyone else, as last reported or interpolated
    remote: IndexMap<EntityId, Entity>,
    controls: Controls,
    sampler: InputSampler,
    pending: PendingInputs,
    interpolator: Interpolator,
}

impl<C: Clock> Client<C> {
    /// Create an unconnected client
    pub fn new(name: impl Into<String>, settings: SettingsHandle, clock: C) -> Self {
        Self {
            name: name.into(),
            inbound: LaggedChannel::new(clock.clone()),
            clock,
            settings,
            connection: Connection::NotConnected,
            entity: None,
            remote: IndexMap::new(),
            controls: Controls::IDLE,
            sampler: InputSampler::new(),
            pending: PendingInputs::new(),
            interpolator: Interpolator::new(),
        }
    }

    /// Attach to a server; called by [`Server::connect`](crate::Server::connect)
    pub(crate) fn bind(&mut self, entity_id: EntityId, uplink: InputChannel<C>) -> Result<()> {
        if let Some(existing) = self.connection.entity_id() {
            return Err(lagsim_core::Error::AlreadyConnected(existing).into());
        }
        self.connection = Connection::Connected { entity_id, uplink };
        Ok(())
    }

    /// Run one tick
    pub fn update(&mut self) {
        self.process_server_messages();
        if self.settings.get().use_entity_interpolation {
            self.interpolate_entities();
        }
        self.process_inputs();
    }

    /// Drain every ready snapshot
    pub fn process_server_messages(&mut self) {
        let Some(own_id) = self.connection.entity_id() else {
            return;
        };

        while let Some(snapshot) = self.inbound.receive() {
            let use_reconciliation = self.settings.get().use_reconciliation;

            for server_entity in snapshot.entities() {
                if server_entity.id != own_id {
                    self.remote.insert(server_entity.id, server_entity.clone());
                    continue;
                }

                let entity = self.entity.get_or_insert_with(|| {
                    debug!(client = %self.name, %own_id, "own entity created");
                    server_entity.clone()
                });

                if use_reconciliation {
                    let outcome = reconcile(
                        entity,
                        server_entity,
                        snapshot.last_processed_input(own_id),
                        &mut self.pending,
                    );
                    debug!(
                        client = %self.name,
                        seq = snapshot.sequence_number(),
                        dropped = outcome.dropped,
                        replayed = outcome.replayed,
                        correction = outcome.correction,
                        "reconciled"
                    );
                } else {
                    entity.position = server_entity.position;
                }
            }

            self.interpolator.push_state(self.clock.now(), snapshot);
        }
    }

    /// Replace remote mirrors with values blended between the last two snapshots
    pub fn interpolate_entities(&mut self) {
        let Some(own_id) = self.connection.entity_id() else {
            return;
        };
        let Some(blended) = self.interpolator.interpolate(self.clock.now(), own_id) else {
            return;
        };
        for entity in blended {
            self.remote.insert(entity.id, entity);
        }
    }

    /// Sample controls and emit an input, if active and a control is held
    pub fn process_inputs(&mut self) {
        let Connection::Connected { entity_id, uplink } = &self.connection else {
            return;
        };
        let Some(entity) = self.entity.as_mut() else {
            return;
        };

        let settings = self.settings.get();
        let Some(input) = self.sampler.sample(self.clock.now(), self.controls, *entity_id) else {
            return;
        };

        uplink.send(settings.lag(), input);

        if settings.use_prediction {
            entity.apply_input(&input);
        }
        if settings.use_reconciliation {
            self.pending.push(input);
        }
    }

    /// Set the held controls; sampled on the next tick
    pub fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    /// Currently held controls
    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Lifecycle state
    pub fn state(&self) -> ClientState {
        match (&self.connection, &self.entity) {
            (Connection::NotConnected, _) => ClientState::Unbound,
            (Connection::Connected { .. }, None) => ClientState::AwaitingFirstSnapshot,
            (Connection::Connected { .. }, Some(_)) => ClientState::Active,
        }
    }

    /// Entity assigned by the server, if connected
    pub fn entity_id(&self) -> Option<EntityId> {
        self.connection.entity_id()
    }

    /// Own entity, once active
    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    /// Own displayed position, once active
    pub fn position(&self) -> Option<f64> {
        self.entity.as_ref().map(|e| e.position)
    }

    /// Displayed copy of a remote entity
    pub fn remote(&self, id: EntityId) -> Option<&Entity> {
        self.remote.get(&id)
    }

    /// Everything to draw this tick, ordered by entity id
    pub fn entities(&self) -> Vec<Entity> {
        let mut all: Vec<Entity> = self
            .remote
            .values()
            .chain(self.entity.as_ref())
            .cloned()
            .collect();
        all.sort_by_key(|e| e.id);
        all
    }

    /// Inputs not yet acknowledged by the server
    pub fn pending_input_count(&self) -> usize {
        self.pending.len()
    }

    /// Snapshots retained for interpolation
    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// Client name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to this client's live settings
    pub fn settings(&self) -> SettingsHandle {
        self.settings.clone()
    }

    /// Handle to the channel snapshots arrive on
    pub fn downlink(&self) -> SnapshotChannel<C> {
        self.inbound.clone()
    }

    /// Push a snapshot straight into the inbound channel with no delay
    #[cfg(test)]
    pub(crate) fn deliver(&self, snapshot: lagsim_core::WorldState) {
        self.inbound.send(std::time::Duration::ZERO, snapshot);
    }
}

impl<C: Clock> Actor for Client<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick_rate(&self) -> TickRate {
        self.settings.get().tick_rate
    }

    fn tick(&mut self) {
        self.update();
    }
}
