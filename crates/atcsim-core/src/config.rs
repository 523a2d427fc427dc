//! Configuration loading and typed config structures for the ATC simulation.
//!
//! The canonical configuration lives in `atcsim-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file yields the stock airport
//! with the stock roster.

use std::path::Path;

use atcsim_aircraft::{MotionParams, RosterEntry, SpawnParams, default_roster};
use atcsim_types::{Point, WeightClass};
use atcsim_world::AirportLayout;
use chrono::TimeDelta;
use serde::Deserialize;

/// Environment variable that overrides `simulation.seed`.
pub const SEED_ENV_VAR: &str = "ATCSIM_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `atcsim-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run-level settings (seed, frame rate, bounds).
    #[serde(default)]
    pub simulation: RunConfig,

    /// Motion integrator parameters.
    #[serde(default)]
    pub motion: MotionParams,

    /// Runway reservation durations.
    #[serde(default)]
    pub runways: RunwayConfig,

    /// Emergency and windshear generator parameters.
    #[serde(default)]
    pub emergencies: EmergencyConfig,

    /// Taxi-in, go-around, and diversion geometry.
    #[serde(default)]
    pub taxi: TaxiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Startup fleet placement.
    #[serde(default)]
    pub fleet: SpawnParams,

    /// Callsigns and weight classes of the startup fleet.
    #[serde(default = "default_roster")]
    pub roster: Vec<RosterEntry>,

    /// Airport layout.
    #[serde(default)]
    pub airport: AirportLayout,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation: RunConfig::default(),
            motion: MotionParams::default(),
            runways: RunwayConfig::default(),
            emergencies: EmergencyConfig::default(),
            taxi: TaxiConfig::default(),
            logging: LoggingConfig::default(),
            fleet: SpawnParams::default(),
            roster: default_roster(),
            airport: AirportLayout::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `ATCSIM_SEED` overrides `simulation.seed` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override values with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `ATCSIM_SEED` is not a `u64`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.simulation
            .apply_seed_override(std::env::var(SEED_ENV_VAR).ok().as_deref())
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability(
            "emergencies.windshear_probability",
            self.emergencies.windshear_probability,
        )?;
        check_probability(
            "emergencies.double_fault_probability",
            self.emergencies.double_fault_probability,
        )?;
        check_probability(
            "fleet.airborne_probability",
            self.fleet.airborne_probability,
        )?;

        check_positive("motion.base_speed", self.motion.base_speed)?;
        check_positive("motion.arrival_threshold", self.motion.arrival_threshold)?;
        check_positive("fleet.bounds.width", self.fleet.bounds.width)?;
        check_positive("fleet.bounds.height", self.fleet.bounds.height)?;

        if self.runways.regular_reservation_ms == 0 || self.runways.heavy_reservation_ms == 0 {
            return Err(invalid("runway reservation durations must be positive"));
        }
        if self.emergencies.check_interval_secs == 0 {
            return Err(invalid("emergencies.check_interval_secs must be at least 1"));
        }
        if self.logging.event_log_capacity == 0 {
            return Err(invalid("logging.event_log_capacity must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

fn check_probability(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be within [0, 1], got {value}")))
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be a positive number, got {value}")))
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// RNG seed. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Delay between ticks in milliseconds (one animation frame).
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Maximum number of ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl RunConfig {
    /// Replace the seed with a raw override value, if one is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the value is not a `u64`.
    pub fn apply_seed_override(&mut self, raw: Option<&str>) -> Result<(), ConfigError> {
        let Some(raw) = raw else {
            return Ok(());
        };
        let seed = raw
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(format!("{SEED_ENV_VAR}={raw:?} is not a valid seed: {e}")))?;
        self.seed = Some(seed);
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            frame_interval_ms: default_frame_interval_ms(),
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Runway reservation durations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunwayConfig {
    /// Hold time for regular traffic, in milliseconds.
    #[serde(default = "default_regular_reservation_ms")]
    pub regular_reservation_ms: u64,

    /// Hold time for heavy traffic, in milliseconds.
    #[serde(default = "default_heavy_reservation_ms")]
    pub heavy_reservation_ms: u64,
}

impl RunwayConfig {
    /// Reservation length for a weight class.
    pub fn reservation_for(&self, weight_class: WeightClass) -> TimeDelta {
        let ms = match weight_class {
            WeightClass::Regular => self.regular_reservation_ms,
            WeightClass::Heavy => self.heavy_reservation_ms,
        };
        TimeDelta::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
    }
}

impl Default for RunwayConfig {
    fn default() -> Self {
        Self {
            regular_reservation_ms: default_regular_reservation_ms(),
            heavy_reservation_ms: default_heavy_reservation_ms(),
        }
    }
}

/// Emergency and windshear generator parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmergencyConfig {
    /// Quiet period after start before any fault may be injected.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Minimum time between two injection passes.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Maximum simultaneously active emergencies.
    #[serde(default = "default_max_active")]
    pub max_active: u32,

    /// Chance that an injection pass tries for two faults instead of one.
    #[serde(default = "default_double_fault_probability")]
    pub double_fault_probability: f64,

    /// Chance that a touchdown attempt meets windshear.
    #[serde(default = "default_windshear_probability")]
    pub windshear_probability: f64,
}

impl EmergencyConfig {
    /// Quiet period as a [`TimeDelta`].
    pub fn initial_delay(&self) -> TimeDelta {
        secs(self.initial_delay_secs)
    }

    /// Injection interval as a [`TimeDelta`].
    pub fn check_interval(&self) -> TimeDelta {
        secs(self.check_interval_secs)
    }
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            check_interval_secs: default_check_interval_secs(),
            max_active: default_max_active(),
            double_fault_probability: default_double_fault_probability(),
            windshear_probability: default_windshear_probability(),
        }
    }
}

/// Post-landing and missed-approach geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxiConfig {
    /// Seconds a landed aircraft taxis before leaving the simulation.
    #[serde(default = "default_taxi_in_secs")]
    pub taxi_in_secs: u64,

    /// Distance behind the touchdown point, on both axes, that a
    /// go-around climbs out to.
    #[serde(default = "default_go_around_offset")]
    pub go_around_offset: f64,

    /// Off-map point diverting aircraft fly to.
    #[serde(default = "default_divert_point")]
    pub divert_point: Point,
}

impl TaxiConfig {
    /// Taxi-in dwell as a [`TimeDelta`].
    pub fn taxi_in(&self) -> TimeDelta {
        secs(self.taxi_in_secs)
    }
}

impl Default for TaxiConfig {
    fn default() -> Self {
        Self {
            taxi_in_secs: default_taxi_in_secs(),
            go_around_offset: default_go_around_offset(),
            divert_point: default_divert_point(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Number of controller log entries kept, newest first.
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

fn secs(value: u64) -> TimeDelta {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

// -----------------------------------------------------------------------
// Defaults
// -----------------------------------------------------------------------

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_regular_reservation_ms() -> u64 {
    60_000
}

const fn default_heavy_reservation_ms() -> u64 {
    180_000
}

const fn default_initial_delay_secs() -> u64 {
    20
}

const fn default_check_interval_secs() -> u64 {
    180
}

const fn default_max_active() -> u32 {
    2
}

const fn default_double_fault_probability() -> f64 {
    0.4
}

const fn default_windshear_probability() -> f64 {
    0.15
}

const fn default_taxi_in_secs() -> u64 {
    5
}

const fn default_go_around_offset() -> f64 {
    100.0
}

const fn default_divert_point() -> Point {
    Point { x: -400.0, y: -400.0 }
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_event_log_capacity() -> usize {
    20
}
