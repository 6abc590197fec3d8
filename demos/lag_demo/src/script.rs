//! Demo configuration and the scripted input source

use lagsim_core::TickRate;
use lagsim_hub::{Error, Result, SimulationConfig};
use lagsim_netcode::{ClientSettings, Controls};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config shipped with the demo, used when no path is given
pub const BUILTIN: &str = include_str!("../demo.ron");

fn default_render_interval_ms() -> u64 {
    500
}

/// Whole demo: the simulation plus what happens to it over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// How often positions are logged
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

/// One scripted action, timed from the start of the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Hold `controls` on `client` between the two instants, then release
    Hold {
        client: String,
        from_ms: u64,
        to_ms: u64,
        controls: Controls,
    },
    /// Replace a client's settings
    Configure {
        client: String,
        at_ms: u64,
        settings: ClientSettings,
    },
    /// Change the server tick rate
    ServerRate { at_ms: u64, tick_rate: TickRate },
}

/// What to do to the hub at one instant
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Controls(String, Controls),
    Settings(String, ClientSettings),
    ServerRate(TickRate),
}

/// An action and when to run it
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub at: Duration,
    pub action: Action,
}

impl DemoConfig {
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the built-in config when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_ron_str(&std::fs::read_to_string(path)?),
            None => Self::from_ron_str(BUILTIN),
        }
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;

        for step in &self.script {
            let client = match step {
                ScriptStep::Hold {
                    client,
                    from_ms,
                    to_ms,
                    ..
                } => {
                    if from_ms >= to_ms {
                        return Err(Error::InvalidConfig(format!(
                            "hold for {client:?} ends before it starts ({from_ms}ms..{to_ms}ms)"
                        )));
                    }
                    client
                }
                ScriptStep::Configure { client, .. } => client,
                ScriptStep::ServerRate { .. } => continue,
            };
            if self.simulation.client(client).is_none() {
                return Err(Error::ClientNotFound(client.clone()));
            }
        }
        Ok(())
    }

    /// Flatten the script into a time-ordered event list
    ///
    /// A hold becomes a press and a release. Events at the same instant keep
    /// script order.
    pub fn events(&self) -> Vec<Event> {
        let mut events = Vec::new();
        for step in &self.script {
            match step {
                ScriptStep::Hold {
                    client,
                    from_ms,
                    to_ms,
                    controls,
                } => {
                    events.push(Event {
                        at: Duration::from_millis(*from_ms),
                        action: Action::Controls(client.clone(), *controls),
                    });
                    events.push(Event {
                        at: Duration::from_millis(*to_ms),
                        action: Action::Controls(client.clone(), Controls::IDLE),
                    });
                }
                ScriptStep::Configure {
                    client,
                    at_ms,
                    settings,
                } => events.push(Event {
                    at: Duration::from_millis(*at_ms),
                    action: Action::Settings(client.clone(), *settings),
                }),
                ScriptStep::ServerRate { at_ms, tick_rate } => events.push(Event {
                    at: Duration::from_millis(*at_ms),
                    action: Action::ServerRate(*tick_rate),
                }),
            }
        }
        events.sort_by_key(|e| e.at);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_is_valid() {
        let config = DemoConfig::load(None).unwrap();
        assert_eq!(config.simulation.clients.len(), 3);
        assert_eq!(config.render_interval(), Duration::from_millis(250));
        assert!(!config.script.is_empty());
    }

    #[test]
    fn test_events_are_sorted_with_releases() {
        let config = DemoConfig::from_ron_str(
            r#"(
                script: [
                    Hold(client: "p1", from_ms: 300, to_ms: 900, controls: (right: true)),
                    Hold(client: "p2", from_ms: 100, to_ms: 500, controls: (left: true)),
                    ServerRate(at_ms: 400, tick_rate: 20.0),
                ],
            )"#,
        )
        .unwrap();

        let times: Vec<_> = config.events().iter().map(|e| e.at.as_millis()).collect();
        assert_eq!(times, vec![100, 300, 400, 500, 900]);

        let events = config.events();
        assert_eq!(
            events[0].action,
            Action::Controls("p2".into(), Controls::LEFT)
        );
        assert_eq!(
            events[4].action,
            Action::Controls("p1".into(), Controls::IDLE)
        );
    }

    #[test]
    fn test_rejects_backwards_hold() {
        let err = DemoConfig::from_ron_str(
            r#"(script: [Hold(client: "p1", from_ms: 500, to_ms: 500, controls: (left: true))])"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_client() {
        let err = DemoConfig::from_ron_str(
            r#"(script: [Configure(client: "p9", at_ms: 0, settings: (lag_ms: 10))])"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ClientNotFound(name) if name == "p9"));
    }
}
