//! Enumeration types for the ATC simulation.
//!
//! Wire names (serde and `TypeScript`) are kebab-case so the UI collaborators
//! see the same status strings the controller panels display.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Aircraft status
// ---------------------------------------------------------------------------

/// Operational status of an aircraft.
///
/// Automatic transitions are driven by arrival at the current destination;
/// manual transitions come from controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum AircraftStatus {
    /// Inbound, flying to the approach anchor of its assigned runway (or
    /// awaiting a landing clearance when no runway is assigned yet).
    Approaching,
    /// On final approach to the runway threshold.
    Landing,
    /// Aborted landing, flying to a temporary point before re-attempting.
    GoAround,
    /// Abandoned the airport after exhausting go-around attempts. Terminal.
    Diverting,
    /// Ground movement to a waiting point or, after landing, towards the
    /// opposite runway end.
    #[serde(rename = "taxing")]
    Taxiing,
    /// Holding at a waiting point, ready to be cleared for takeoff.
    ReadyForTakeoff,
    /// Rolling towards the runway point for departure.
    TakingOff,
    /// Departed and climbing out.
    Airborne,
    /// Holding position on controller instruction.
    Waiting,
    /// Parked on the ground with no task.
    OnGround,
}

impl AircraftStatus {
    /// Return the kebab-case wire name of this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approaching => "approaching",
            Self::Landing => "landing",
            Self::GoAround => "go-around",
            Self::Diverting => "diverting",
            Self::Taxiing => "taxing",
            Self::ReadyForTakeoff => "ready-for-takeoff",
            Self::TakingOff => "taking-off",
            Self::Airborne => "airborne",
            Self::Waiting => "waiting",
            Self::OnGround => "on-ground",
        }
    }

    /// Whether the aircraft has left tower control for good. Neither
    /// commands nor automatic transitions leave this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Diverting)
    }
}

impl core::fmt::Display for AircraftStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Weight class
// ---------------------------------------------------------------------------

/// Wake-turbulence weight class. Drives runway reservation length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum WeightClass {
    /// Narrow-body traffic.
    Regular,
    /// Wide-body traffic; holds a runway three times as long.
    Heavy,
}

impl WeightClass {
    /// Return the lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Heavy => "heavy",
        }
    }
}

impl core::fmt::Display for WeightClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Emergencies
// ---------------------------------------------------------------------------

/// In-flight fault injected by the emergency generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum EmergencyKind {
    /// Fire on board.
    Fire,
    /// Loss of an engine.
    EngineOut,
    /// Bird strike.
    BirdHit,
    /// Hydraulic system failure.
    HydraulicFailure,
    /// Electrical system failure.
    ElectricalFailure,
}

impl EmergencyKind {
    /// Every fault kind, in a fixed order for uniform sampling.
    pub const ALL: [Self; 5] = [
        Self::Fire,
        Self::EngineOut,
        Self::BirdHit,
        Self::HydraulicFailure,
        Self::ElectricalFailure,
    ];

    /// Return the kebab-case wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::EngineOut => "engine-out",
            Self::BirdHit => "bird-hit",
            Self::HydraulicFailure => "hydraulic-failure",
            Self::ElectricalFailure => "electrical-failure",
        }
    }

    /// Upper-case headline used in alerts, e.g. `ENGINE OUT`.
    pub fn headline(self) -> String {
        self.as_str().replace('-', " ").to_uppercase()
    }
}

impl core::fmt::Display for EmergencyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Log severity
// ---------------------------------------------------------------------------

/// Severity tag attached to every controller log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Routine notification.
    Info,
    /// A clearance or transition completed.
    Success,
    /// A request was refused or an abnormal event occurred.
    Warning,
    /// An invalid request or an emergency.
    Error,
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
