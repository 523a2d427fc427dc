//! Tick callback that reports progress to the log.

use atcsim_core::{TickCallback, TickSummary};
use tracing::{debug, info};

/// Logs a progress line every `every` ticks, and every tick on which an
/// aircraft left the simulation or a fault was injected.
pub struct HeartbeatCallback {
    every: u64,
}

impl HeartbeatCallback {
    /// Create a callback reporting every `every` ticks (minimum 1).
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// Whether `summary` deserves a progress line.
    pub fn is_notable(&self, summary: &TickSummary) -> bool {
        summary.tick.checked_rem(self.every) == Some(0)
            || !summary.departed.is_empty()
            || summary.faults_injected > 0
    }
}

impl TickCallback for HeartbeatCallback {
    fn on_tick(&mut self, summary: &TickSummary) {
        if self.is_notable(summary) {
            info!(
                tick = summary.tick,
                fleet = summary.fleet_size,
                moving = summary.moving,
                departed = summary.departed.len(),
                active_emergencies = summary.active_emergencies,
                "Simulation progress"
            );
        } else {
            debug!(tick = summary.tick, "Tick");
        }
    }
}
