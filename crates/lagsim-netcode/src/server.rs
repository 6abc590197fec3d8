//! Authoritative server
//!
//! Every tick the server drains its input channel, applies the inputs that
//! pass validation, and sends one snapshot of the whole world to every
//! connected client with that client's configured delay.

use crate::transport::{ClientLink, InputChannel};
use crate::{Client, Error, Rejection, Result, ServerConfig};
use indexmap::IndexMap;
use lagsim_core::{Actor, Clock, Entity, EntityId, Input, LaggedChannel, TickRate, WorldState};
use tracing::{debug, info, warn};

/// Counters for what the server has done so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerStats {
    /// Inputs applied
    pub inputs_accepted: u64,
    /// Inputs dropped by validation
    pub inputs_rejected: u64,
    /// Snapshots built (one per tick)
    pub snapshots: u64,
}

/// The authoritative simulation
#[derive(Debug)]
pub struct Server<C: Clock> {
    config: ServerConfig,
    inbound: InputChannel<C>,
    /// Indexed by entity id
    entities: Vec<Entity>,
    last_processed_input: IndexMap<EntityId, u64>,
    clients: Vec<ClientLink<C>>,
    snapshot_sequence: u64,
    stats: ServerStats,
}

impl<C: Clock> Server<C> {
    /// Create a server with no clients
    pub fn new(config: ServerConfig, clock: C) -> Self {
        Self {
            config,
            inbound: LaggedChannel::new(clock),
            entities: Vec::new(),
            last_processed_input: IndexMap::new(),
            clients: Vec::new(),
            snapshot_sequence: 0,
            stats: ServerStats::default(),
        }
    }

    /// Connect a client, creating its entity at the spawn position
    ///
    /// The new entity's id is the number of clients connected before it.
    /// Fails if the client is already connected to a server.
    pub fn connect(&mut self, client: &mut Client<C>) -> Result<EntityId> {
        if let Some(existing) = client.entity_id() {
            return Err(lagsim_core::Error::AlreadyConnected(existing).into());
        }

        let entity_id = EntityId::from(self.clients.len());
        client.bind(entity_id, self.inbound.clone())?;

        self.entities.push(Entity::new(
            entity_id,
            self.config.spawn_position,
            self.config.entity_speed,
        ));
        self.clients.push(ClientLink {
            name: client.name().to_string(),
            entity_id,
            downlink: client.downlink(),
            settings: client.settings(),
        });

        info!(client = client.name(), %entity_id, "client connected");
        Ok(entity_id)
    }

    /// Run one tick: apply pending inputs, then broadcast a snapshot
    pub fn update(&mut self) {
        self.process_inputs();
        self.broadcast();
    }

    /// Drain every ready input, applying the valid ones
    ///
    /// Returns the number of inputs applied.
    pub fn process_inputs(&mut self) -> usize {
        let mut applied = 0;
        while let Some(input) = self.inbound.receive() {
            match self.apply_input(&input) {
                Ok(()) => applied += 1,
                Err(err) => {
                    self.stats.inputs_rejected += 1;
                    warn!(entity_id = %input.entity_id, "{err}");
                }
            }
        }
        applied
    }

    /// Validate and apply a single input
    pub fn apply_input(&mut self, input: &Input) -> Result<()> {
        self.validate_input(input)
            .map_err(|reason| Error::InputRejected {
                sequence_number: input.sequence_number,
                reason,
            })?;

        let entity = self
            .entities
            .get_mut(input.entity_id.index())
            .ok_or(lagsim_core::Error::UnknownEntity(input.entity_id))?;
        entity.apply_input(input);

        let last = self
            .last_processed_input
            .entry(input.entity_id)
            .or_insert(input.sequence_number);
        *last = (*last).max(input.sequence_number);

        self.stats.inputs_accepted += 1;
        debug!(
            entity_id = %input.entity_id,
            seq = input.sequence_number,
            position = entity.position,
            "input applied"
        );
        Ok(())
    }

    /// Check an input for plausibility
    ///
    /// A press can't last longer than the configured bound; anything else is
    /// assumed to be a broken or cheating client.
    pub fn validate_input(&self, input: &Input) -> std::result::Result<(), Rejection> {
        if !input.press_duration.is_finite() {
            return Err(Rejection::NotFinite);
        }
        if input.press_duration.abs() > self.config.max_press_duration {
            return Err(Rejection::PressTooLong {
                press_duration: input.press_duration,
                limit: self.config.max_press_duration,
            });
        }
        if input.entity_id.index() >= self.entities.len() {
            return Err(Rejection::UnknownEntity(input.entity_id));
        }
        Ok(())
    }

    /// Send a fresh snapshot to every client
    ///
    /// All clients get the same content; each copy is delayed by that
    /// client's current lag.
    pub fn broadcast(&mut self) -> u64 {
        self.snapshot_sequence += 1;
        self.stats.snapshots += 1;
        let snapshot = WorldState::capture(
            self.snapshot_sequence,
            &self.entities,
            &self.last_processed_input,
        );

        for link in &self.clients {
            let lag = link.settings.get().lag();
            link.downlink.send(lag, snapshot.clone());
        }
        debug!(
            seq = self.snapshot_sequence,
            clients = self.clients.len(),
            "snapshot broadcast"
        );
        self.snapshot_sequence
    }

    /// Change the simulation rate; takes effect when the driver restarts its timer
    pub fn set_tick_rate(&mut self, tick_rate: TickRate) {
        info!(from = %self.config.tick_rate, to = %tick_rate, "server tick rate changed");
        self.config.tick_rate = tick_rate;
    }

    /// Authoritative entities in id order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Look up one entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    /// Highest input sequence number applied for `id`
    pub fn last_processed_input(&self, id: EntityId) -> Option<u64> {
        self.last_processed_input.get(&id).copied()
    }

    /// Sequence number of the most recent snapshot (0 before the first)
    pub fn snapshot_sequence(&self) -> u64 {
        self.snapshot_sequence
    }

    /// Connected clients, in connection order
    pub fn clients(&self) -> &[ClientLink<C>] {
        &self.clients
    }

    /// Inputs waiting in the inbound channel
    pub fn queued_inputs(&self) -> usize {
        self.inbound.len()
    }

    /// Counters
    pub fn stats(&self) -> ServerStats {
        self.stats
    }

    /// Current configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl<C: Clock> Actor for Server<C> {
    fn name(&self) -> &str {
        "server"
    }

    fn tick_rate(&self) -> TickRate {
        self.config.tick_rate
    }

    fn tick(&mut self) {
        self.update();
    }
}
