//! Simulation configuration
//!
//! A simulation is one server plus any number of named clients, loaded from
//! RON:
//!
//! ```ron
//! (
//!     server: (tick_rate: 5.0),
//!     clients: [
//!         (name: "p1", settings: (lag_ms: 250, use_prediction: true, use_reconciliation: true)),
//!         (name: "p2", settings: (lag_ms: 150, use_entity_interpolation: true)),
//!     ],
//! )
//! ```
//!
//! Omitted fields take their defaults (server at 5 Hz, clients at 60 Hz with
//! 250 ms lag and every technique off).

use crate::{Error, Result};
use lagsim_netcode::{ClientSettings, ServerConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One client of the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Unique name, used in logs and to look the client up
    pub name: String,
    /// Initial settings; may be changed while running
    #[serde(default)]
    pub settings: ClientSettings,
}

impl ClientConfig {
    /// A client with default settings
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: ClientSettings::default(),
        }
    }
}

/// Configuration for a whole simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Clients, connected in this order
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

impl Default for SimulationConfig {
    /// One server and three clients, `p1` to `p3`
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            clients: ["p1", "p2", "p3"]
                .into_iter()
                .map(ClientConfig::named)
                .collect(),
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Render as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Check invariants serde can't express
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if !server.spawn_position.is_finite() {
            return Err(Error::InvalidConfig("spawn_position must be finite".into()));
        }
        if !server.entity_speed.is_finite() {
            return Err(Error::InvalidConfig("entity_speed must be finite".into()));
        }
        if !(server.max_press_duration.is_finite() && server.max_press_duration >= 0.0) {
            return Err(Error::InvalidConfig(
                "max_press_duration must be finite and >= 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for client in &self.clients {
            if client.name.trim().is_empty() {
                return Err(Error::InvalidConfig("client name must not be empty".into()));
            }
            if !seen.insert(client.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate client name {:?}",
                    client.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a client by name
    pub fn client(&self, name: &str) -> Option<&ClientConfig> {
        self.clients.iter().find(|c| c.name == name)
    }
}
