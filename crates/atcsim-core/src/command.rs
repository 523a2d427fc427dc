//! Controller commands.
//!
//! The UI speaks in `(command, value)` string pairs. [`Command::parse`]
//! turns a pair into a typed [`Command`] whose target has already been
//! checked against the [`Geography`], so the dispatcher never steers an
//! aircraft at an undefined point.

use atcsim_types::{RunwayCode, WaitingPointCode};
use atcsim_world::Geography;

/// Errors produced while parsing or applying a controller command.
///
/// None of these are fatal. Each is logged and the command becomes a
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The command name is not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The runway code is not in the registry.
    #[error("unknown runway: {0}")]
    UnknownRunway(String),

    /// The waiting-point code is not in the registry.
    #[error("unknown waiting point: {0}")]
    UnknownWaitingPoint(String),

    /// No aircraft is selected.
    #[error("No aircraft selected")]
    NoSelection,

    /// The selected aircraft has left the simulation.
    #[error("No aircraft selected")]
    StaleSelection,

    /// No aircraft with that callsign exists.
    #[error("unknown callsign: {0}")]
    UnknownCallsign(String),

    /// The aircraft is diverting and no longer takes clearances.
    #[error("diverting, no longer under tower control")]
    Diverting,

    /// The runway is reserved by an earlier clearance.
    #[error("runway {runway} in use, clear in {remaining_secs}s")]
    RunwayBusy {
        /// The reserved runway.
        runway: RunwayCode,
        /// Whole seconds until it is free, rounded up.
        remaining_secs: u64,
    },
}

/// A validated controller command for the selected aircraft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clear to land: fly to the approach anchor, then the runway.
    ClearLanding {
        /// Landing runway.
        runway: RunwayCode,
    },
    /// Clear for takeoff from a runway.
    ClearTakeoff {
        /// Departure runway.
        runway: RunwayCode,
    },
    /// Taxi to a waiting point.
    Taxi {
        /// Destination waiting point.
        point: WaitingPointCode,
    },
    /// Stop and hold position.
    Hold,
    /// Stop and wait in the airspace.
    WaitAirspace,
}

impl Command {
    /// Parse a raw `(command, value)` pair.
    ///
    /// Accepted names: `runway`, `runway-takeoff`, `taxi`, `hold`,
    /// `wait-airspace`. The value is ignored for `hold` and
    /// `wait-airspace`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownCommand`] for an unrecognised name,
    /// or [`CommandError::UnknownRunway`] /
    /// [`CommandError::UnknownWaitingPoint`] when the target is not in the
    /// registry.
    pub fn parse(name: &str, value: &str, geography: &Geography) -> Result<Self, CommandError> {
        let runway = || {
            geography
                .resolve_runway(value)
                .ok_or_else(|| CommandError::UnknownRunway(value.trim().to_owned()))
        };

        match name.trim() {
            "runway" => Ok(Self::ClearLanding { runway: runway()? }),
            "runway-takeoff" => Ok(Self::ClearTakeoff { runway: runway()? }),
            "taxi" => geography
                .resolve_waiting_point(value)
                .map(|point| Self::Taxi { point })
                .ok_or_else(|| CommandError::UnknownWaitingPoint(value.trim().to_owned())),
            "hold" => Ok(Self::Hold),
            "wait-airspace" => Ok(Self::WaitAirspace),
            other => Err(CommandError::UnknownCommand(other.to_owned())),
        }
    }

    /// Wire name of the command.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClearLanding { .. } => "runway",
            Self::ClearTakeoff { .. } => "runway-takeoff",
            Self::Taxi { .. } => "taxi",
            Self::Hold => "hold",
            Self::WaitAirspace => "wait-airspace",
        }
    }
}
