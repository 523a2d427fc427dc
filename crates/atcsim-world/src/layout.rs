//! Airport layout definitions and the default airport.
//!
//! A layout is plain data, deserializable from the `airport` section of the
//! configuration file. The default airport has two parallel runway pairs
//! (`06/24` to the north, `07/25` to the south) and eight waiting points
//! on the taxiways between them.

use atcsim_types::{Point, RunwayCode, WaitingPointCode};
use serde::Deserialize;

/// Offset of the approach anchor from the runway threshold, along x.
const APPROACH_OFFSET: f64 = 100.0;

/// Definition of one runway end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunwayDef {
    /// Runway code, e.g. `06`.
    pub code: RunwayCode,
    /// Threshold coordinate: the landing target and takeoff point.
    pub threshold: Point,
    /// Approach anchor flown to before final approach.
    pub approach: Point,
    /// Code of the opposite end, used to route taxi-in after landing.
    pub opposite: RunwayCode,
}

/// Definition of one waiting point.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WaitingPointDef {
    /// Waiting point code, e.g. `C1`.
    pub code: WaitingPointCode,
    /// Coordinate of the hold line.
    pub position: Point,
}

/// Complete static layout of an airport.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AirportLayout {
    /// Runway ends.
    pub runways: Vec<RunwayDef>,
    /// Taxi waiting points.
    pub waiting_points: Vec<WaitingPointDef>,
}

impl Default for AirportLayout {
    fn default() -> Self {
        default_layout()
    }
}

/// Helper to build a [`RunwayDef`] whose approach anchor sits on the
/// extended centerline, `approach_dx` units from the threshold.
fn runway(code: &str, x: f64, y: f64, approach_dx: f64, opposite: &str) -> RunwayDef {
    RunwayDef {
        code: RunwayCode::from(code),
        threshold: Point::new(x, y),
        approach: Point::new(x + approach_dx, y),
        opposite: RunwayCode::from(opposite),
    }
}

/// Helper to build a [`WaitingPointDef`].
fn waiting_point(code: &str, x: f64, y: f64) -> WaitingPointDef {
    WaitingPointDef {
        code: WaitingPointCode::from(code),
        position: Point::new(x, y),
    }
}

/// Build the default airport layout.
pub fn default_layout() -> AirportLayout {
    AirportLayout {
        runways: vec![
            runway("06", 1034.0, 629.0, -APPROACH_OFFSET, "24"),
            runway("24", 1891.0, 629.0, APPROACH_OFFSET, "06"),
            runway("07", 1946.0, 1144.0, -APPROACH_OFFSET, "25"),
            runway("25", 1035.0, 1144.0, -APPROACH_OFFSET, "07"),
        ],
        waiting_points: vec![
            // --- Northern taxiway (runway 06/24) ---
            waiting_point("C1", 1031.0, 670.0),
            waiting_point("C2", 1082.0, 670.0),
            waiting_point("C7", 1847.0, 670.0),
            waiting_point("C8", 1899.0, 670.0),
            // --- Southern taxiway (runway 07/25) ---
            waiting_point("A1", 1030.0, 1111.0),
            waiting_point("A2", 1082.0, 1111.0),
            waiting_point("A7", 1900.0, 1111.0),
            waiting_point("A8", 1950.0, 1111.0),
        ],
    }
}
