//! Aircraft entities for the ATC simulation.
//!
//! # Modules
//!
//! - [`aircraft`] -- The mutable [`Aircraft`] record and its read-only
//!   snapshot.
//! - [`motion`] -- Per-tick destination-seeking integrator.
//! - [`roster`] -- Startup fleet spawner and the built-in roster.
//! - [`error`] -- Fleet construction errors.

pub mod aircraft;
pub mod error;
pub mod motion;
pub mod roster;

pub use aircraft::{Aircraft, DEFAULT_MAX_GO_AROUNDS};
pub use error::AircraftError;
pub use motion::{MotionOutcome, MotionParams};
pub use roster::{
    HEAVY_MODELS, MapBounds, REGULAR_MODELS, RosterEntry, SpawnParams, default_roster, models_for,
    spawn_fleet,
};
