//! Destination-seeking motion integrator.
//!
//! Once per tick every aircraft with a destination re-aims straight at it
//! and advances one speed step. Inside the arrival threshold the aircraft
//! snaps onto the destination and the destination is cleared; that edge is
//! reported as [`MotionOutcome::Arrived`] for the arrival handler.
//!
//! # Speed profile
//!
//! | condition                                   | factor |
//! |---------------------------------------------|--------|
//! | `landing`                                   | 0.4    |
//! | on the ground, `taxing` or `ready-for-takeoff` | 0.5 |
//! | otherwise                                   | 1.0    |
//!
//! Heading changes are instantaneous; there is no turn-rate limit and no
//! collision check.

use std::f64::consts::PI;

use atcsim_types::{AircraftStatus, Point};
use serde::Deserialize;

use crate::aircraft::Aircraft;

/// Tunable parameters of the motion integrator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionParams {
    /// Distance covered per tick at full speed.
    #[serde(default = "default_base_speed")]
    pub base_speed: f64,

    /// Remaining distance below which the aircraft has arrived.
    #[serde(default = "default_arrival_threshold")]
    pub arrival_threshold: f64,

    /// Remaining distance at which a landing aircraft locks onto a
    /// horizontal final approach.
    #[serde(default = "default_final_approach_distance")]
    pub final_approach_distance: f64,

    /// Speed factor while landing.
    #[serde(default = "default_landing_speed_factor")]
    pub landing_speed_factor: f64,

    /// Speed factor while taxiing on the ground.
    #[serde(default = "default_taxi_speed_factor")]
    pub taxi_speed_factor: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            base_speed: default_base_speed(),
            arrival_threshold: default_arrival_threshold(),
            final_approach_distance: default_final_approach_distance(),
            landing_speed_factor: default_landing_speed_factor(),
            taxi_speed_factor: default_taxi_speed_factor(),
        }
    }
}

const fn default_base_speed() -> f64 {
    2.0
}

const fn default_arrival_threshold() -> f64 {
    5.0
}

const fn default_final_approach_distance() -> f64 {
    200.0
}

const fn default_landing_speed_factor() -> f64 {
    0.4
}

const fn default_taxi_speed_factor() -> f64 {
    0.5
}

/// Result of one motion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionOutcome {
    /// No destination; the aircraft did not move.
    Idle,
    /// The aircraft moved and is still short of its destination.
    Moving {
        /// Distance left after this step.
        remaining: f64,
    },
    /// The aircraft reached its destination this tick.
    Arrived {
        /// The destination it snapped onto.
        at: Point,
    },
}

impl MotionOutcome {
    /// Whether this step is an arrival edge.
    pub const fn is_arrival(&self) -> bool {
        matches!(self, Self::Arrived { .. })
    }
}

impl Aircraft {
    /// Advance this aircraft by one tick.
    pub fn update(&mut self, params: &MotionParams) -> MotionOutcome {
        let Some(destination) = self.destination else {
            return MotionOutcome::Idle;
        };

        let dx = destination.x - self.position.x;
        let dy = destination.y - self.position.y;
        let distance = dx.hypot(dy);

        if distance < params.arrival_threshold {
            self.position = destination;
            self.destination = None;
            return MotionOutcome::Arrived { at: destination };
        }

        let mut heading = dy.atan2(dx);
        // Final-approach lock: once established on the extended centerline
        // the aircraft flies straight along x. The lateral gate lets a
        // go-around re-approach from off the centerline converge instead of
        // flying parallel to it forever.
        if self.status == AircraftStatus::Landing
            && distance <= params.final_approach_distance
            && dy.abs() < params.arrival_threshold / 2.0
        {
            heading = if dx >= 0.0 { 0.0 } else { PI };
        }
        self.heading = heading;

        let step = self.current_speed(params).min(distance);
        self.position = self
            .position
            .offset(heading.cos() * step, heading.sin() * step);

        MotionOutcome::Moving {
            remaining: self.position.distance_to(destination),
        }
    }

    /// Speed for the current status, per the speed profile.
    pub fn current_speed(&self, params: &MotionParams) -> f64 {
        let factor = match self.status {
            AircraftStatus::Landing => params.landing_speed_factor,
            AircraftStatus::Taxiing | AircraftStatus::ReadyForTakeoff if !self.is_in_air => {
                params.taxi_speed_factor
            }
            _ => 1.0,
        };
        params.base_speed * factor
    }
}
