//! Simulation loop runner with operator controls.
//!
//! [`run_simulation`] is the top-level async loop for one engine. It owns
//! the engine for the whole run and is the only place that mutates it:
//!
//! - **Controller requests** arrive on an `mpsc` channel and are applied
//!   between ticks, in arrival order.
//! - **Bounded simulation**: stop after `max_ticks` or
//!   `max_real_time_seconds`.
//! - **Pause/resume**: no ticks while paused, but requests are still served
//!   so the controller can inspect and command a frozen picture.
//! - **Operator stop**: clean exit before the next tick.

use std::sync::Arc;
use std::time::Duration;

use atcsim_types::{EngineSnapshot, LogEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::clock::TimeSource;
use crate::command::CommandError;
use crate::engine::{SimulationEngine, TickError, TickSummary};
use crate::operator::{OperatorState, SimulationEndReason};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// A controller request for the engine task.
#[derive(Debug)]
pub enum ControlRequest {
    /// Select an aircraft by callsign.
    Select {
        /// Callsign to select.
        callsign: String,
        /// Receives the outcome.
        reply: Option<oneshot::Sender<Result<(), CommandError>>>,
    },
    /// Apply a raw `(command, value)` pair to the selection.
    Command {
        /// Command name.
        name: String,
        /// Runway or waiting-point code; ignored by `hold` and
        /// `wait-airspace`.
        value: String,
        /// Receives the outcome.
        reply: Option<oneshot::Sender<Result<(), CommandError>>>,
    },
    /// Request a full snapshot.
    Snapshot(oneshot::Sender<EngineSnapshot>),
    /// Request the activity log, newest first.
    Log(oneshot::Sender<Vec<LogEvent>>),
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation<T: TimeSource>(
    engine: &mut SimulationEngine<T>,
    operator: &Arc<OperatorState>,
    requests: &mut mpsc::Receiver<ControlRequest>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let mut requests_open = true;

    info!(
        max_ticks = operator.bounds().max_ticks,
        max_real_time_seconds = operator.bounds().max_real_time_seconds,
        frame_interval_ms = operator.frame_interval_ms(),
        "Simulation starting"
    );

    loop {
        if operator.is_paused() {
            requests_open = idle_while_paused(engine, operator, requests, requests_open).await;
        }

        if let Some(reason) = stop_before_tick(operator) {
            return Ok(finish(operator, reason, last_summary, total_ticks).await);
        }

        if requests_open {
            requests_open = drain_requests(engine, requests);
        }

        let summary = engine.tick()?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary);

        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.bounds().max_ticks,
                "Tick limit reached"
            );
            let reason = SimulationEndReason::TickLimit;
            return Ok(finish(operator, reason, Some(summary), total_ticks).await);
        }
        last_summary = Some(summary);

        match operator.frame_interval_ms() {
            0 => tokio::task::yield_now().await,
            ms => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
    }
}

/// Serve controller requests until the run is resumed or stopped.
/// Returns whether the request channel is still open.
async fn idle_while_paused<T: TimeSource>(
    engine: &mut SimulationEngine<T>,
    operator: &OperatorState,
    requests: &mut mpsc::Receiver<ControlRequest>,
    mut requests_open: bool,
) -> bool {
    info!(tick = engine.clock().tick(), "Simulation paused");
    while operator.is_paused() && !operator.is_stop_requested() {
        if !requests_open {
            operator.wait_if_paused().await;
            continue;
        }
        tokio::select! {
            () = operator.wait_if_paused() => {}
            request = requests.recv() => match request {
                Some(request) => handle_request(engine, request),
                None => requests_open = false,
            },
        }
    }
    info!(tick = engine.clock().tick(), "Simulation resumed");
    requests_open
}

/// Stop conditions checked before each frame.
fn stop_before_tick(operator: &OperatorState) -> Option<SimulationEndReason> {
    if operator.is_stop_requested() {
        info!("Operator stop requested");
        return Some(SimulationEndReason::OperatorStop);
    }
    if operator.time_limit_reached() {
        info!(
            max_seconds = operator.bounds().max_real_time_seconds,
            elapsed = operator.elapsed_seconds(),
            "Real-time limit reached"
        );
        return Some(SimulationEndReason::WallClockLimit);
    }
    None
}

async fn finish(
    operator: &OperatorState,
    end_reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> SimulationResult {
    operator.set_end_reason(end_reason).await;
    SimulationResult {
        end_reason,
        final_summary,
        total_ticks,
    }
}

/// Apply every queued request. Returns `false` once the channel is closed.
fn drain_requests<T: TimeSource>(
    engine: &mut SimulationEngine<T>,
    requests: &mut mpsc::Receiver<ControlRequest>,
) -> bool {
    loop {
        match requests.try_recv() {
            Ok(request) => handle_request(engine, request),
            Err(mpsc::error::TryRecvError::Empty) => return true,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                debug!("Controller channel closed");
                return false;
            }
        }
    }
}

/// Apply one controller request to the engine.
pub fn handle_request<T: TimeSource>(engine: &mut SimulationEngine<T>, request: ControlRequest) {
    match request {
        ControlRequest::Select { callsign, reply } => {
            let outcome = engine.select(&callsign).map(|_| ());
            send(reply, outcome);
        }
        ControlRequest::Command { name, value, reply } => {
            let outcome = engine.apply_raw(&name, &value);
            send(reply, outcome);
        }
        ControlRequest::Snapshot(reply) => {
            if reply.send(engine.snapshot()).is_err() {
                debug!("Snapshot requester went away");
            }
        }
        ControlRequest::Log(reply) => {
            let entries = engine.events().iter().cloned().collect();
            if reply.send(entries).is_err() {
                debug!("Log requester went away");
            }
        }
    }
}

fn send<V>(reply: Option<oneshot::Sender<V>>, value: V) {
    if reply.is_some_and(|reply| reply.send(value).is_err()) {
        debug!("Requester went away before the reply");
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_fleet = result.final_summary.as_ref().map(|s| s.fleet_size),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            fleet_size = summary.fleet_size,
            active_emergencies = summary.active_emergencies,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}
