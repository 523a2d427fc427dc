//! Airport geography for the ATC simulation.
//!
//! This crate models the static airport: runway ends with their approach
//! anchors and opposite-end pairing, and the taxi waiting points. Nothing
//! here mutates after construction.
//!
//! # Modules
//!
//! - [`error`] -- Error types for layout validation.
//! - [`geography`] -- The [`Geography`] registry with `Option`-returning
//!   lookups.
//! - [`layout`] -- Deserializable layout definitions and the default
//!   airport.

pub mod error;
pub mod geography;
pub mod layout;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use geography::{Geography, RunwayInfo};
pub use layout::{AirportLayout, RunwayDef, WaitingPointDef, default_layout};
