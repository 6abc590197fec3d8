//! Hub - wires a server and its clients to tick drivers
//!
//! The hub owns every actor behind an `Arc<Mutex<_>>`. All clients are
//! connected in configuration order when the hub is built, before any
//! driver runs, so the first server tick already sees every entity.
//!
//! ```rust
//! use lagsim_core::ManualClock;
//! use lagsim_hub::{Hub, SimulationConfig};
//!
//! let hub = Hub::from_config(&SimulationConfig::default(), ManualClock::new()).unwrap();
//! assert_eq!(hub.client_names(), vec!["p1", "p2", "p3"]);
//! assert_eq!(hub.server_entities().len(), 3);
//! ```

use crate::driver::{lock, stop_all, DriverHandle, TickDriver};
use crate::{Error, Result, SimulationConfig};
use lagsim_core::{Clock, Entity, EntityId, TickRate};
use lagsim_netcode::{Client, ClientSettings, ClientState, Controls, Server, SettingsHandle};
use std::sync::{Arc, Mutex};
use tracing::info;

/// What a client currently shows
#[derive(Debug, Clone, PartialEq)]
pub struct ClientView {
    /// Client name
    pub name: String,
    /// Lifecycle state
    pub state: ClientState,
    /// Own entity id, once connected
    pub entity_id: Option<EntityId>,
    /// Own entity position, once the first snapshot arrived
    pub position: Option<f64>,
    /// Inputs sent but not yet acknowledged
    pub pending_inputs: usize,
    /// Every entity the client knows about, own entity included
    pub entities: Vec<Entity>,
}

struct ClientSlot<C: Clock> {
    name: String,
    client: Arc<Mutex<Client<C>>>,
    settings: SettingsHandle,
    driver: Option<DriverHandle>,
}

/// A running (or ready to run) simulation
pub struct Hub<C: Clock> {
    clock: C,
    server: Arc<Mutex<Server<C>>>,
    server_driver: Option<DriverHandle>,
    clients: Vec<ClientSlot<C>>,
}

impl<C: Clock> Hub<C> {
    /// Build the server and connect every configured client
    pub fn from_config(config: &SimulationConfig, clock: C) -> Result<Self> {
        config.validate()?;

        let mut server = Server::new(config.server.clone(), clock.clone());
        let mut clients = Vec::with_capacity(config.clients.len());
        for entry in &config.clients {
            let settings = SettingsHandle::new(entry.settings);
            let mut client = Client::new(entry.name.clone(), settings.clone(), clock.clone());
            server.connect(&mut client)?;
            clients.push(ClientSlot {
                name: entry.name.clone(),
                client: Arc::new(Mutex::new(client)),
                settings,
                driver: None,
            });
        }

        info!(
            clients = clients.len(),
            server_rate = %config.server.tick_rate,
            "hub created"
        );
        Ok(Self {
            clock,
            server: Arc::new(Mutex::new(server)),
            server_driver: None,
            clients,
        })
    }

    /// Spawn a driver for the server and one per client
    ///
    /// Must be called from within a tokio runtime. Does nothing if already
    /// running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.server_driver = Some(TickDriver::spawn(self.server.clone()));
        for slot in &mut self.clients {
            slot.driver = Some(TickDriver::spawn(slot.client.clone()));
        }
        info!(at = %self.clock.now(), "hub started");
    }

    /// Stop every driver and wait for them to exit
    ///
    /// Actor state is kept; the hub can be started again. Every driver is
    /// stopped even if one of them failed; the first failure is returned.
    pub async fn stop(&mut self) -> Result<()> {
        let drivers: Vec<_> = self
            .server_driver
            .take()
            .into_iter()
            .chain(self.clients.iter_mut().filter_map(|slot| slot.driver.take()))
            .collect();
        let result = stop_all(drivers).await;
        info!(at = %self.clock.now(), ok = result.is_ok(), "hub stopped");
        result
    }

    /// Whether drivers are running
    pub fn is_running(&self) -> bool {
        self.server_driver.is_some()
    }

    /// Shared clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The server actor
    pub fn server(&self) -> Arc<Mutex<Server<C>>> {
        self.server.clone()
    }

    /// A client actor by name
    pub fn client(&self, name: &str) -> Result<Arc<Mutex<Client<C>>>> {
        Ok(self.slot(name)?.client.clone())
    }

    /// Client names in connection order
    pub fn client_names(&self) -> Vec<&str> {
        self.clients.iter().map(|s| s.name.as_str()).collect()
    }

    /// Change the server rate; restarts its timer if running
    pub fn set_server_tick_rate(&self, rate: TickRate) -> Result<()> {
        lock(&self.server).set_tick_rate(rate);
        if let Some(driver) = &self.server_driver {
            driver.set_tick_rate(rate)?;
        }
        Ok(())
    }

    /// Change a client's rate; restarts its timer if running
    pub fn set_client_tick_rate(&self, name: &str, rate: TickRate) -> Result<()> {
        self.update_client_settings(name, |s| s.tick_rate = rate)
            .map(|_| ())
    }

    /// Edit a client's settings in place
    ///
    /// Lag applies from the server's next broadcast, flags from the client's
    /// next tick, and a new tick rate restarts the client's timer. Returns
    /// the settings now in effect.
    pub fn update_client_settings(
        &self,
        name: &str,
        f: impl FnOnce(&mut ClientSettings),
    ) -> Result<ClientSettings> {
        let slot = self.slot(name)?;
        let before = slot.settings.get();
        slot.settings.update(f);
        let after = slot.settings.get();

        if after.tick_rate != before.tick_rate {
            if let Some(driver) = &slot.driver {
                driver.set_tick_rate(after.tick_rate)?;
            }
        }
        if after != before {
            info!(client = name, ?after, "client settings changed");
        }
        Ok(after)
    }

    /// Current settings of a client
    pub fn client_settings(&self, name: &str) -> Result<ClientSettings> {
        Ok(self.slot(name)?.settings.get())
    }

    /// Set which keys a client is holding
    pub fn set_controls(&self, name: &str, controls: Controls) -> Result<()> {
        lock(&self.slot(name)?.client).set_controls(controls);
        Ok(())
    }

    /// What a client currently shows
    pub fn client_view(&self, name: &str) -> Result<ClientView> {
        let client = lock(&self.slot(name)?.client);
        Ok(ClientView {
            name: name.to_string(),
            state: client.state(),
            entity_id: client.entity_id(),
            position: client.position(),
            pending_inputs: client.pending_input_count(),
            entities: client.entities(),
        })
    }

    /// Views of every client in connection order
    pub fn client_views(&self) -> Vec<ClientView> {
        self.clients
            .iter()
            .filter_map(|s| self.client_view(&s.name).ok())
            .collect()
    }

    /// Copy of the authoritative entities
    pub fn server_entities(&self) -> Vec<Entity> {
        lock(&self.server).entities().to_vec()
    }

    fn slot(&self, name: &str) -> Result<&ClientSlot<C>> {
        self.clients
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::ClientNotFound(name.to_string()))
    }
}
