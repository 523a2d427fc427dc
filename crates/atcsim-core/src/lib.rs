//! Simulation clock, runway scheduling, command dispatch, and the tick loop
//! for the ATC simulation.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter, start instant, and pluggable time sources.
//! - [`config`] -- Configuration loading from `atcsim-config.yaml` into
//!   strongly-typed structs.
//! - [`scheduler`] -- Per-runway reservations.
//! - [`command`] -- Controller command parsing and rejection reasons.
//! - [`dispatcher`] -- Applying a command to one aircraft.
//! - [`arrival`] -- The status machine fired when an aircraft reaches its
//!   destination.
//! - [`emergency`] -- Time-gated fault injection.
//! - [`events`] -- The bounded activity log.
//! - [`engine`] -- [`SimulationEngine`], the owner of all mutable state.
//! - [`operator`] -- Pause, resume, stop, and run bounds.
//! - [`runner`] -- The async frame loop that drives an engine.
//!
//! [`SimulationEngine`]: engine::SimulationEngine

pub mod arrival;
pub mod clock;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod emergency;
pub mod engine;
pub mod events;
pub mod operator;
pub mod runner;
pub mod scheduler;

pub use clock::{ManualTimeSource, SimulationClock, SystemTimeSource, TimeSource};
pub use command::{Command, CommandError};
pub use config::{ConfigError, SimulationConfig};
pub use engine::{SetupError, SimulationEngine, TickError, TickSummary};
pub use events::{EventLog, EventSink, Notice};
pub use operator::{OperatorState, RunBounds, SimulationEndReason};
pub use runner::{
    ControlRequest, NoOpCallback, RunnerError, SimulationResult, TickCallback, log_simulation_end,
    run_simulation,
};
