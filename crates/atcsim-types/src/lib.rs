//! Shared type definitions for the ATC simulation.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries and the boundary to the renderer and UI panels. Types flow to
//! `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Aircraft UUID ids and runway / waiting-point code newtypes
//! - [`enums`] -- Aircraft status, weight class, emergency kind, log severity
//! - [`structs`] -- Plane points, snapshots, and controller log events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AircraftStatus, EmergencyKind, Severity, WeightClass};
pub use ids::{AircraftId, RunwayCode, WaitingPointCode};
pub use structs::{AircraftSnapshot, EngineSnapshot, LogEvent, Point, RunwayStatus};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the renderer collaborators.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AircraftId::export_all();
        let _ = crate::ids::RunwayCode::export_all();
        let _ = crate::ids::WaitingPointCode::export_all();

        // Enums
        let _ = crate::enums::AircraftStatus::export_all();
        let _ = crate::enums::WeightClass::export_all();
        let _ = crate::enums::EmergencyKind::export_all();
        let _ = crate::enums::Severity::export_all();

        // Structs
        let _ = crate::structs::Point::export_all();
        let _ = crate::structs::AircraftSnapshot::export_all();
        let _ = crate::structs::RunwayStatus::export_all();
        let _ = crate::structs::LogEvent::export_all();
        let _ = crate::structs::EngineSnapshot::export_all();
    }
}
