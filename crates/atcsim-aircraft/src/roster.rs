//! Startup fleet spawner.
//!
//! At simulation start the spawner turns a roster of callsigns into live
//! aircraft. Each entry picks a random airframe model for its weight class
//! and then flips a coin: airborne aircraft appear on a random edge of the
//! map awaiting a landing clearance, grounded aircraft are parked at a
//! random waiting point ready for takeoff.

use std::collections::BTreeSet;

use atcsim_types::{Point, WeightClass};
use atcsim_world::Geography;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

use crate::aircraft::{Aircraft, DEFAULT_MAX_GO_AROUNDS};
use crate::error::AircraftError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// One roster line: a callsign and its weight class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    /// Radio callsign.
    pub callsign: String,
    /// Weight class.
    pub weight_class: WeightClass,
}

impl RosterEntry {
    /// Build a roster entry.
    pub fn new(callsign: impl Into<String>, weight_class: WeightClass) -> Self {
        Self {
            callsign: callsign.into(),
            weight_class,
        }
    }
}

/// Extent of the simulated airspace.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MapBounds {
    /// Width along x.
    #[serde(default = "default_width")]
    pub width: f64,
    /// Height along y.
    #[serde(default = "default_height")]
    pub height: f64,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

const fn default_width() -> f64 {
    2000.0
}

const fn default_height() -> f64 {
    1500.0
}

/// Knobs for [`spawn_fleet`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawnParams {
    /// Chance that a roster entry starts airborne.
    #[serde(default = "default_airborne_probability")]
    pub airborne_probability: f64,

    /// Go-around allowance given to every aircraft.
    #[serde(default = "default_max_go_arounds")]
    pub max_go_arounds: u32,

    /// Map extent; airborne aircraft spawn on its edges.
    #[serde(default)]
    pub bounds: MapBounds,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            airborne_probability: default_airborne_probability(),
            max_go_arounds: default_max_go_arounds(),
            bounds: MapBounds::default(),
        }
    }
}

const fn default_airborne_probability() -> f64 {
    0.5
}

const fn default_max_go_arounds() -> u32 {
    DEFAULT_MAX_GO_AROUNDS
}

// -----------------------------------------------------------------------
// Model pools
// -----------------------------------------------------------------------

/// Airframes flown by regular traffic.
pub const REGULAR_MODELS: &[&str] = &["A320", "A319", "B737", "B757"];

/// Airframes flown by heavy traffic.
pub const HEAVY_MODELS: &[&str] = &["A380", "B747", "B777", "A350"];

/// Model pool for a weight class.
pub const fn models_for(weight_class: WeightClass) -> &'static [&'static str] {
    match weight_class {
        WeightClass::Regular => REGULAR_MODELS,
        WeightClass::Heavy => HEAVY_MODELS,
    }
}

/// The built-in eight-aircraft roster.
pub fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("AAL123", WeightClass::Regular),
        RosterEntry::new("DAL456", WeightClass::Heavy),
        RosterEntry::new("UAL789", WeightClass::Regular),
        RosterEntry::new("SWA234", WeightClass::Heavy),
        RosterEntry::new("ACA567", WeightClass::Regular),
        RosterEntry::new("BAW890", WeightClass::Regular),
        RosterEntry::new("LAX123", WeightClass::Heavy),
        RosterEntry::new("KLM456", WeightClass::Regular),
    ]
}

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Build the startup fleet from a roster.
///
/// # Errors
///
/// Returns an [`AircraftError`] if the roster is empty, contains a blank or
/// duplicate callsign, or the airport has no waiting points.
pub fn spawn_fleet<R: Rng + ?Sized>(
    roster: &[RosterEntry],
    geography: &Geography,
    params: &SpawnParams,
    rng: &mut R,
) -> Result<Vec<Aircraft>, AircraftError> {
    if roster.is_empty() {
        return Err(AircraftError::EmptyRoster);
    }

    let mut seen = BTreeSet::new();
    for (index, entry) in roster.iter().enumerate() {
        let callsign = entry.callsign.trim();
        if callsign.is_empty() {
            return Err(AircraftError::EmptyCallsign { index });
        }
        if !seen.insert(callsign) {
            return Err(AircraftError::DuplicateCallsign(callsign.to_owned()));
        }
    }

    let parking: Vec<_> = geography
        .waiting_points()
        .map(|(code, point)| (code.clone(), point))
        .collect();
    if parking.is_empty() {
        return Err(AircraftError::NoWaitingPoints);
    }

    let airborne_probability = params.airborne_probability.clamp(0.0, 1.0);
    let mut fleet = Vec::with_capacity(roster.len());

    for entry in roster {
        let callsign = entry.callsign.trim();
        let model = pick_model(rng, entry.weight_class);

        let spawned = if rng.random_bool(airborne_probability) {
            let position = edge_position(rng, params.bounds);
            Aircraft::airborne(callsign, entry.weight_class, model, position)
        } else {
            let slot = rng.random_range(0..parking.len());
            let (code, point) = parking
                .get(slot)
                .cloned()
                .ok_or(AircraftError::NoWaitingPoints)?;
            Aircraft::grounded(callsign, entry.weight_class, model, point, Some(code))
        };
        let aircraft = spawned.with_max_go_arounds(params.max_go_arounds);

        debug!(
            callsign = %aircraft.callsign,
            model = %aircraft.model,
            status = %aircraft.status,
            x = aircraft.position.x,
            y = aircraft.position.y,
            "Spawned aircraft"
        );
        fleet.push(aircraft);
    }

    let airborne = fleet.iter().filter(|a| a.is_in_air).count();
    info!(
        total = fleet.len(),
        airborne,
        grounded = fleet.len() - airborne,
        "Fleet spawned"
    );

    Ok(fleet)
}

fn pick_model<R: Rng + ?Sized>(rng: &mut R, weight_class: WeightClass) -> &'static str {
    let pool = models_for(weight_class);
    let idx = rng.random_range(0..pool.len());
    pool.get(idx).copied().unwrap_or("A320")
}

/// Random point on one of the four map edges: top, right, bottom, left.
fn edge_position<R: Rng + ?Sized>(rng: &mut R, bounds: MapBounds) -> Point {
    let along_x = rng.random::<f64>() * bounds.width;
    let along_y = rng.random::<f64>() * bounds.height;
    match rng.random_range(0..4_u8) {
        0 => Point::new(along_x, 0.0),
        1 => Point::new(bounds.width, along_y),
        2 => Point::new(along_x, bounds.height),
        _ => Point::new(0.0, along_y),
    }
}
