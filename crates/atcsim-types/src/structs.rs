//! Plane geometry, read-only snapshots, and controller log events.
//!
//! Snapshots are what the renderer and UI panels consume each frame. They
//! are plain data copies; nothing in here can mutate engine state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AircraftStatus, EmergencyKind, Severity, WeightClass};
use crate::ids::{AircraftId, RunwayCode, WaitingPointCode};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A position on the abstract 2-D simulation plane.
///
/// `x` grows to the right and `y` grows downwards, matching map pixel
/// coordinates of the airport chart.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Return this point shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Read-only copy of one aircraft's full state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AircraftSnapshot {
    /// Stable identifier.
    pub id: AircraftId,
    /// Radio callsign, unique within the fleet.
    pub callsign: String,
    /// Weight class.
    pub weight_class: WeightClass,
    /// Airframe model (descriptive only).
    pub model: String,
    /// Current position.
    pub position: Point,
    /// Heading in radians, measured from the +x axis.
    pub heading: f64,
    /// Current destination, if any.
    pub destination: Option<Point>,
    /// Operational status.
    pub status: AircraftStatus,
    /// Whether the aircraft is airborne.
    pub is_in_air: bool,
    /// Runway the aircraft is cleared for, if any.
    pub assigned_runway: Option<RunwayCode>,
    /// Waiting point the aircraft was last cleared to taxi to.
    pub assigned_waiting_point: Option<WaitingPointCode>,
    /// Instant at which the taxi-in completes and the aircraft leaves.
    pub taxi_deadline: Option<DateTime<Utc>>,
    /// Active emergency, if any.
    pub emergency: Option<EmergencyKind>,
    /// When the active emergency was declared.
    pub emergency_started_at: Option<DateTime<Utc>>,
    /// Whether the aircraft has encountered windshear on this arrival.
    pub has_windshear: bool,
    /// Go-arounds flown so far.
    pub go_around_attempts: u32,
    /// Go-arounds allowed before diverting.
    pub max_go_arounds: u32,
    /// Human-readable location label for the detail panel.
    pub location: String,
    /// Whether this aircraft is the controller's current selection.
    pub selected: bool,
}

/// Reservation state of a single runway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunwayStatus {
    /// Runway code.
    pub runway: RunwayCode,
    /// Expiry of the current reservation, if one is still in force.
    pub reserved_until: Option<DateTime<Utc>>,
    /// Whole seconds (rounded up) until the runway is free; 0 when free.
    pub remaining_secs: u64,
}

/// A controller-facing log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEvent {
    /// Simulation tick during which the event was emitted.
    pub tick: u64,
    /// Wall-clock instant of the event.
    pub at: DateTime<Utc>,
    /// Severity tag.
    pub severity: Severity,
    /// Free-text message.
    pub message: String,
}

/// Complete read-only view of the engine for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EngineSnapshot {
    /// Last completed tick.
    pub tick: u64,
    /// Instant the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Milliseconds elapsed since the simulation started.
    pub elapsed_ms: i64,
    /// Every aircraft in the fleet, in roster order.
    pub aircraft: Vec<AircraftSnapshot>,
    /// Reservation state of every runway, ordered by code.
    pub runways: Vec<RunwayStatus>,
    /// Currently selected aircraft, if any.
    pub selected: Option<AircraftId>,
    /// Number of emergencies currently active.
    pub active_emergencies: u32,
}
