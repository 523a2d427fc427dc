//! Simulation host binary for the ATC simulation.
//!
//! Wires the engine, the operator controls, and the controller console
//! together, then runs the frame loop until a bound is hit or the operator
//! quits.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `atcsim-config.yaml` in the working directory
//! 2. Initialize structured logging (tracing)
//! 3. Build the engine: airport, fleet, RNG, activity log
//! 4. Create operator state from the run bounds
//! 5. Spawn the engine task, which owns the engine for the whole run
//! 6. Run the stdin console, feeding the engine task over a channel
//! 7. Log the result

mod console;
mod error;
mod heartbeat;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use atcsim_core::{
    OperatorState, SimulationConfig, SimulationEngine, SystemTimeSource, log_simulation_end,
    run_simulation,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::console::ConsoleSink;
use crate::error::EngineError;
use crate::heartbeat::HeartbeatCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "atcsim-config.yaml";

/// Ticks between progress lines (about ten seconds at 60 frames/s).
const HEARTBEAT_TICKS: u64 = 600;

/// Depth of the controller request queue.
const REQUEST_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, loaded_from) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("atcsim-engine starting");
    match loaded_from {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!(path = %config_path.display(), "Config file not found, using defaults"),
    }
    info!(
        seed = ?config.simulation.seed,
        frame_interval_ms = config.simulation.frame_interval_ms,
        roster = config.roster.len(),
        "Run settings"
    );

    // 3. Build the engine.
    let operator = Arc::new(OperatorState::new(&config.simulation));
    let mut engine =
        SimulationEngine::new(config, SystemTimeSource).map_err(EngineError::from)?;
    engine.set_event_sink(Box::new(ConsoleSink));

    // 4. Spawn the engine task.
    let (requests_tx, mut requests_rx) = mpsc::channel(REQUEST_QUEUE);
    let engine_task = {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            let mut callback = HeartbeatCallback::new(HEARTBEAT_TICKS);
            run_simulation(&mut engine, &operator, &mut requests_rx, &mut callback).await
        })
    };

    // 5. Run the console alongside it.
    let lines = console::spawn_stdin_reader();
    let console_task = tokio::spawn(console::run(lines, requests_tx, Arc::clone(&operator)));

    // 6. Wait for the run to end.
    let result = engine_task
        .await
        .map_err(|e| EngineError::Task {
            message: e.to_string(),
        })?
        .map_err(EngineError::from)
        .context("simulation run failed")?;
    console_task.abort();

    // 7. Log results.
    log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "atcsim-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `path`, or defaults when the file is missing.
///
/// Returns the path the configuration came from, if any.
fn load_config(path: &Path) -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok((config, Some(path.to_path_buf())))
    } else {
        Ok((SimulationConfig::parse("")?, None))
    }
}
