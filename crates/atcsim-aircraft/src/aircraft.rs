//! Per-aircraft mutable state.
//!
//! An [`Aircraft`] bundles identity, kinematics, operational state, and the
//! advisory emergency state. The engine mutates these fields directly when
//! applying commands and transitions; the motion integrator lives in
//! [`crate::motion`].

use atcsim_types::{
    AircraftId, AircraftSnapshot, AircraftStatus, EmergencyKind, Point, RunwayCode,
    WaitingPointCode, WeightClass,
};
use chrono::{DateTime, Utc};

/// Go-arounds an aircraft may fly before it is forced to divert.
pub const DEFAULT_MAX_GO_AROUNDS: u32 = 2;

/// Full state of one aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    /// Stable identifier.
    pub id: AircraftId,
    /// Radio callsign.
    pub callsign: String,
    /// Weight class.
    pub weight_class: WeightClass,
    /// Airframe model (descriptive only).
    pub model: String,
    /// Current position.
    pub position: Point,
    /// Heading in radians from the +x axis.
    pub heading: f64,
    /// Point the aircraft is steering towards.
    pub destination: Option<Point>,
    /// Operational status.
    pub status: AircraftStatus,
    /// Whether the aircraft is airborne.
    pub is_in_air: bool,
    /// Runway the aircraft is cleared for.
    pub assigned_runway: Option<RunwayCode>,
    /// Waiting point the aircraft was last cleared to.
    pub assigned_waiting_point: Option<WaitingPointCode>,
    /// When the taxi-in after landing completes.
    pub taxi_deadline: Option<DateTime<Utc>>,
    /// Active emergency.
    pub emergency: Option<EmergencyKind>,
    /// When the active emergency was declared.
    pub emergency_started_at: Option<DateTime<Utc>>,
    /// Set once windshear has been encountered on this arrival.
    pub has_windshear: bool,
    /// Go-arounds flown.
    pub go_around_attempts: u32,
    /// Go-arounds allowed before diverting.
    pub max_go_arounds: u32,
}

impl Aircraft {
    /// Create an inbound aircraft awaiting a landing clearance.
    pub fn airborne(
        callsign: impl Into<String>,
        weight_class: WeightClass,
        model: impl Into<String>,
        position: Point,
    ) -> Self {
        Self::new(
            callsign.into(),
            weight_class,
            model.into(),
            position,
            AircraftStatus::Approaching,
            true,
        )
    }

    /// Create a grounded aircraft holding at a waiting point.
    pub fn grounded(
        callsign: impl Into<String>,
        weight_class: WeightClass,
        model: impl Into<String>,
        position: Point,
        waiting_point: Option<WaitingPointCode>,
    ) -> Self {
        let mut aircraft = Self::new(
            callsign.into(),
            weight_class,
            model.into(),
            position,
            AircraftStatus::ReadyForTakeoff,
            false,
        );
        aircraft.assigned_waiting_point = waiting_point;
        aircraft
    }

    fn new(
        callsign: String,
        weight_class: WeightClass,
        model: String,
        position: Point,
        status: AircraftStatus,
        is_in_air: bool,
    ) -> Self {
        Self {
            id: AircraftId::new(),
            callsign,
            weight_class,
            model,
            position,
            heading: 0.0,
            destination: None,
            status,
            is_in_air,
            assigned_runway: None,
            assigned_waiting_point: None,
            taxi_deadline: None,
            emergency: None,
            emergency_started_at: None,
            has_windshear: false,
            go_around_attempts: 0,
            max_go_arounds: DEFAULT_MAX_GO_AROUNDS,
        }
    }

    /// Override the go-around allowance.
    #[must_use]
    pub fn with_max_go_arounds(mut self, max_go_arounds: u32) -> Self {
        self.max_go_arounds = max_go_arounds;
        self
    }

    /// Whether the emergency generator may inject a fault into this aircraft.
    pub const fn is_fault_candidate(&self) -> bool {
        self.is_in_air && self.emergency.is_none()
    }

    /// Whether the go-around allowance has been used up.
    pub const fn go_arounds_exhausted(&self) -> bool {
        self.go_around_attempts > self.max_go_arounds
    }

    /// Location label shown in flight lists and the detail panel.
    pub fn location_label(&self) -> String {
        if let Some(runway) = &self.assigned_runway {
            format!("Runway {runway}")
        } else if let Some(point) = &self.assigned_waiting_point {
            format!("Waiting Point {point}")
        } else if self.is_in_air {
            String::from("Approaching")
        } else {
            String::from("On Ground")
        }
    }

    /// Copy the current state into a read-only snapshot.
    pub fn snapshot(&self, selected: bool) -> AircraftSnapshot {
        AircraftSnapshot {
            id: self.id,
            callsign: self.callsign.clone(),
            weight_class: self.weight_class,
            model: self.model.clone(),
            position: self.position,
            heading: self.heading,
            destination: self.destination,
            status: self.status,
            is_in_air: self.is_in_air,
            assigned_runway: self.assigned_runway.clone(),
            assigned_waiting_point: self.assigned_waiting_point.clone(),
            taxi_deadline: self.taxi_deadline,
            emergency: self.emergency,
            emergency_started_at: self.emergency_started_at,
            has_windshear: self.has_windshear,
            go_around_attempts: self.go_around_attempts,
            max_go_arounds: self.max_go_arounds,
            location: self.location_label(),
            selected,
        }
    }
}
