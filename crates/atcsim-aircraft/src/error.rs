//! Error types for the atcsim-aircraft crate.
//!
//! Only fleet construction can fail. Once an aircraft exists every update
//! on it is infallible.

/// Errors that can occur while building the startup fleet.
#[derive(Debug, thiserror::Error)]
pub enum AircraftError {
    /// The roster contains no entries.
    #[error("roster is empty")]
    EmptyRoster,

    /// A roster entry has a blank callsign.
    #[error("roster entry {index} has an empty callsign")]
    EmptyCallsign {
        /// Position of the entry in the roster.
        index: usize,
    },

    /// Two roster entries share a callsign.
    #[error("duplicate callsign: {0}")]
    DuplicateCallsign(String),

    /// Grounded aircraft need at least one waiting point to park at.
    #[error("airport has no waiting points to place grounded aircraft")]
    NoWaitingPoints,
}
