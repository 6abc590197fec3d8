//! Headless lag simulation
//!
//! Runs one server and a handful of clients in real time, drives their
//! controls from a script, and logs what every client shows at a fixed
//! interval.
//!
//! # Usage
//!
//! ```bash
//! # Built-in scenario for ten seconds
//! lag_demo
//!
//! # Custom scenario, with per-input logging
//! lag_demo --config my_scenario.ron --duration-secs 20 --log-level debug
//! ```

mod script;

use clap::Parser;
use lagsim_core::{Clock, Entity, SystemClock};
use lagsim_hub::{Hub, SimulationConfig};
use script::{Action, DemoConfig, Event};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Lag simulation demo
#[derive(Parser, Debug)]
#[command(name = "lag_demo")]
#[command(about = "Client-side prediction, reconciliation and interpolation under simulated lag")]
#[command(version)]
struct Args {
    /// RON scenario file; the built-in scenario is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How long to run
    #[arg(short, long, default_value = "10")]
    duration_secs: f64,

    /// Print the default simulation config as RON and exit
    #[arg(long)]
    print_default: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    if args.print_default {
        tracing::info!("default config:\n{}", SimulationConfig::default().to_ron_string()?);
        return Ok(());
    }

    let demo = DemoConfig::load(args.config.as_deref())?;
    let run_for = Duration::try_from_secs_f64(args.duration_secs)?;

    let mut hub = Hub::from_config(&demo.simulation, SystemClock::new())?;
    hub.start();
    tracing::info!(?run_for, clients = ?hub.client_names(), "simulation running");

    let started = Instant::now();
    let deadline = started + run_for;
    let mut render = interval(demo.render_interval());
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events = demo.events().into_iter().peekable();

    loop {
        let next_event = events.peek().map(|e| started + e.at);
        tokio::select! {
            _ = sleep_until(deadline) => break,
            _ = render.tick() => render_frame(&hub),
            _ = sleep_until(next_event.unwrap_or(deadline)), if next_event.is_some() => {
                if let Some(event) = events.next() {
                    apply(&hub, event)?;
                }
            }
        }
    }

    hub.stop().await?;
    render_frame(&hub);
    tracing::info!("simulation finished");
    Ok(())
}

fn apply<C: Clock>(hub: &Hub<C>, event: Event) -> lagsim_hub::Result<()> {
    tracing::debug!(at = ?event.at, action = ?event.action, "script");
    match event.action {
        Action::Controls(client, controls) => hub.set_controls(&client, controls),
        Action::Settings(client, settings) => {
            hub.update_client_settings(&client, |s| *s = settings)?;
            Ok(())
        }
        Action::ServerRate(rate) => hub.set_server_tick_rate(rate),
    }
}

fn describe(entities: &[Entity]) -> String {
    entities
        .iter()
        .map(|e| format!("{}={:.3}", e.id, e.position))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Log what the server and every client currently show
fn render_frame<C: Clock>(hub: &Hub<C>) {
    let now = hub.clock().now();
    tracing::info!(at = %now, view = %describe(&hub.server_entities()), "server");
    for view in hub.client_views() {
        tracing::info!(
            at = %now,
            client = %view.name,
            pending = view.pending_inputs,
            view = %describe(&view.entities),
            "client"
        );
    }
}
