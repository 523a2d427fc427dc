//! Run controls shared between the engine task and the controller console.
//!
//! The console flips flags here; the frame loop in [`crate::runner`] reads
//! them between ticks. Nothing in this module touches engine state.
//!
//! Flags are atomics so the loop never locks on the hot path. A [`Notify`]
//! wakes a paused loop on resume or stop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::RunConfig;

/// Why a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationEndReason {
    /// `simulation.max_ticks` frames were run.
    TickLimit,
    /// `simulation.max_real_time_seconds` of wall time elapsed.
    WallClockLimit,
    /// The controller quit.
    OperatorStop,
}

/// Upper bounds on a run. Zero means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunBounds {
    /// Frames to run before stopping.
    pub max_ticks: u64,
    /// Wall-clock seconds to run before stopping.
    pub max_real_time_seconds: u64,
}

impl RunBounds {
    /// Whether `tick` frames exhaust the tick bound.
    pub const fn ticks_exhausted(&self, tick: u64) -> bool {
        self.max_ticks != 0 && tick >= self.max_ticks
    }

    /// Whether `elapsed_secs` of wall time exhaust the time bound.
    pub const fn wall_clock_exhausted(&self, elapsed_secs: u64) -> bool {
        self.max_real_time_seconds != 0 && elapsed_secs >= self.max_real_time_seconds
    }
}

/// Pause, stop, pacing, and bounds for one run.
#[derive(Debug)]
pub struct OperatorState {
    paused: AtomicBool,
    stopping: AtomicBool,
    frame_interval_ms: AtomicU64,
    wake: Notify,
    bounds: RunBounds,
    started: Instant,
    outcome: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Controls for a run configured by `run`. The wall clock starts now.
    pub fn new(run: &RunConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            frame_interval_ms: AtomicU64::new(run.frame_interval_ms),
            wake: Notify::new(),
            bounds: RunBounds {
                max_ticks: run.max_ticks,
                max_real_time_seconds: run.max_real_time_seconds,
            },
            started: Instant::now(),
            outcome: Mutex::new(None),
        }
    }

    // --- pause ---

    /// Whether the loop should hold off ticking.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Freeze the picture. Controller requests are still served.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Unfreeze and wake a waiting loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.wake.notify_one();
    }

    /// Return once the run is unpaused or stopping.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.wake.notified().await;
        }
    }

    // --- stop ---

    /// Ask the loop to finish before its next tick. Wakes a paused loop.
    pub fn request_stop(&self) {
        self.stopping.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether a stop is pending.
    pub fn is_stop_requested(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Record how the run finished.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        *self.outcome.lock().await = Some(reason);
    }

    /// How the run finished, once it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.outcome.lock().await
    }

    // --- pacing and bounds ---

    /// Delay between frames in milliseconds. Zero runs flat out.
    pub fn frame_interval_ms(&self) -> u64 {
        self.frame_interval_ms.load(Ordering::Relaxed)
    }

    /// Change the frame delay for the rest of the run.
    pub fn set_frame_interval_ms(&self, interval_ms: u64) {
        self.frame_interval_ms.store(interval_ms, Ordering::Relaxed);
    }

    /// The run's bounds.
    pub const fn bounds(&self) -> RunBounds {
        self.bounds
    }

    /// Whether `tick` reaches the tick bound.
    pub const fn tick_limit_reached(&self, tick: u64) -> bool {
        self.bounds.ticks_exhausted(tick)
    }

    /// Whether the wall-clock bound has passed.
    pub fn time_limit_reached(&self) -> bool {
        self.bounds.wall_clock_exhausted(self.elapsed_seconds())
    }

    /// Whole wall-clock seconds since the controls were created.
    pub fn elapsed_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
