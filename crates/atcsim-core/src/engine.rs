//! The simulation engine.
//!
//! [`SimulationEngine`] owns every piece of mutable simulation state: the
//! fleet, the controller's selection, runway reservations, the emergency
//! counter, the clock, the RNG, and the activity log. It is the single
//! writer; hosts drive it with [`tick`](SimulationEngine::tick) and feed
//! controller input through [`select`](SimulationEngine::select) and
//! [`apply_command`](SimulationEngine::apply_command) between ticks.
//!
//! # Tick order
//!
//! 1. Advance the clock.
//! 2. Step the motion integrator for every aircraft.
//! 3. Run the arrival handler for every aircraft that arrived this tick.
//! 4. Remove landed aircraft whose taxi-in deadline has passed.
//! 5. Poll the emergency generator.

use atcsim_aircraft::{Aircraft, AircraftError, spawn_fleet};
use atcsim_types::{AircraftId, AircraftStatus, EngineSnapshot, RunwayStatus};
use atcsim_world::{Geography, WorldError};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::arrival::{ArrivalContext, handle_arrival};
use crate::clock::{ClockError, SimulationClock, SystemTimeSource, TimeSource};
use crate::command::{Command, CommandError};
use crate::config::SimulationConfig;
use crate::dispatcher::{DispatchContext, dispatch};
use crate::emergency::EmergencyGenerator;
use crate::events::{EventLog, EventSink, Notice};
use crate::scheduler::RunwayScheduler;

/// Errors that can occur while building an engine.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The airport layout failed validation.
    #[error("airport layout error: {source}")]
    World {
        /// The underlying layout error.
        #[from]
        source: WorldError,
    },

    /// The startup fleet could not be built.
    #[error("fleet error: {source}")]
    Fleet {
        /// The underlying fleet error.
        #[from]
        source: AircraftError,
    },
}

/// Errors that can occur during a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that just completed.
    pub tick: u64,
    /// Instant the tick ran at.
    pub at: DateTime<Utc>,
    /// Aircraft that moved this tick.
    pub moving: usize,
    /// Aircraft that reached their destination this tick.
    pub arrivals: usize,
    /// Callsigns removed after completing taxi-in.
    pub departed: Vec<String>,
    /// Faults injected this tick.
    pub faults_injected: usize,
    /// Fleet size after the tick.
    pub fleet_size: usize,
    /// Active emergencies after the tick.
    pub active_emergencies: u32,
}

/// Owner of all mutable simulation state.
#[derive(Debug)]
pub struct SimulationEngine<T: TimeSource = SystemTimeSource> {
    config: SimulationConfig,
    geography: Geography,
    fleet: Vec<Aircraft>,
    selected: Option<AircraftId>,
    scheduler: RunwayScheduler,
    emergencies: EmergencyGenerator,
    clock: SimulationClock,
    events: EventLog,
    rng: StdRng,
    time: T,
}

impl<T: TimeSource> SimulationEngine<T> {
    /// Build an engine and spawn the startup fleet from the configured
    /// roster.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the airport layout is invalid or the
    /// roster cannot be spawned.
    pub fn new(config: SimulationConfig, time: T) -> Result<Self, SetupError> {
        let geography = Geography::from_layout(&config.airport)?;
        let mut rng = seeded_rng(config.simulation.seed);
        let fleet = spawn_fleet(&config.roster, &geography, &config.fleet, &mut rng)?;
        Ok(Self::assemble(config, geography, fleet, rng, time))
    }

    /// Build an engine around an explicit fleet.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the airport layout is invalid.
    pub fn with_fleet(
        config: SimulationConfig,
        fleet: Vec<Aircraft>,
        time: T,
    ) -> Result<Self, SetupError> {
        let geography = Geography::from_layout(&config.airport)?;
        let rng = seeded_rng(config.simulation.seed);
        Ok(Self::assemble(config, geography, fleet, rng, time))
    }

    fn assemble(
        config: SimulationConfig,
        geography: Geography,
        fleet: Vec<Aircraft>,
        rng: StdRng,
        time: T,
    ) -> Self {
        let started_at = time.now();
        let mut events = EventLog::new(config.logging.event_log_capacity);
        events.record_notice(0, started_at, Notice::success("ATC Simulator initialized"));
        info!(
            aircraft = fleet.len(),
            runways = geography.runway_count(),
            waiting_points = geography.waiting_point_count(),
            seed = ?config.simulation.seed,
            "Simulation engine ready"
        );
        Self {
            emergencies: EmergencyGenerator::new(config.emergencies.clone()),
            clock: SimulationClock::new(started_at),
            scheduler: RunwayScheduler::new(),
            selected: None,
            config,
            geography,
            fleet,
            events,
            rng,
            time,
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by one frame.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if the tick counter overflows.
    pub fn tick(&mut self) -> Result<TickSummary, TickError> {
        let tick = self.clock.advance()?;
        let now = self.time.now();

        // --- Motion ---
        let mut arrived = Vec::new();
        let mut moving: usize = 0;
        for (idx, aircraft) in self.fleet.iter_mut().enumerate() {
            let outcome = aircraft.update(&self.config.motion);
            if outcome.is_arrival() {
                arrived.push(idx);
            } else if aircraft.destination.is_some() {
                moving = moving.saturating_add(1);
            }
        }

        // --- Arrivals ---
        let mut ctx = ArrivalContext {
            geography: &self.geography,
            taxi: &self.config.taxi,
            windshear_probability: self.config.emergencies.windshear_probability,
            emergencies: &mut self.emergencies,
            now,
        };
        for &idx in &arrived {
            let Some(aircraft) = self.fleet.get_mut(idx) else {
                continue;
            };
            for notice in handle_arrival(aircraft, &mut ctx, &mut self.rng) {
                self.events.record_notice(tick, now, notice);
            }
        }

        // --- Taxi-in removal ---
        let departed = self.remove_departed(tick, now);

        // --- Emergencies ---
        let notices = self.emergencies.poll(
            &mut self.fleet,
            self.clock.started_at(),
            now,
            &mut self.rng,
        );
        let faults_injected = notices.len();
        for notice in notices {
            self.events.record_notice(tick, now, notice);
        }

        let summary = TickSummary {
            tick,
            at: now,
            moving,
            arrivals: arrived.len(),
            departed,
            faults_injected,
            fleet_size: self.fleet.len(),
            active_emergencies: self.emergencies.active(),
        };
        debug!(
            tick,
            moving = summary.moving,
            arrivals = summary.arrivals,
            fleet = summary.fleet_size,
            "Tick complete"
        );
        Ok(summary)
    }

    fn remove_departed(&mut self, tick: u64, now: DateTime<Utc>) -> Vec<String> {
        let (gone, staying): (Vec<Aircraft>, Vec<Aircraft>) =
            std::mem::take(&mut self.fleet)
                .into_iter()
                .partition(|aircraft| {
                    aircraft.status == AircraftStatus::Taxiing
                        && aircraft.taxi_deadline.is_some_and(|deadline| now > deadline)
                });
        self.fleet = staying;

        let mut departed = Vec::with_capacity(gone.len());
        for aircraft in gone {
            if self.selected == Some(aircraft.id) {
                self.selected = None;
            }
            info!(callsign = %aircraft.callsign, "Aircraft left the simulation");
            self.events.record_notice(
                tick,
                now,
                Notice::success(format!("{} taxied to gate and departed", aircraft.callsign)),
            );
            departed.push(aircraft.callsign);
        }
        departed
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select the aircraft with `callsign` as the target of later commands.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownCallsign`] if no aircraft matches.
    /// The previous selection is kept.
    pub fn select(&mut self, callsign: &str) -> Result<AircraftId, CommandError> {
        let callsign = callsign.trim();
        let id = self
            .fleet
            .iter()
            .find(|aircraft| aircraft.callsign.eq_ignore_ascii_case(callsign))
            .map(|aircraft| aircraft.id)
            .ok_or_else(|| CommandError::UnknownCallsign(callsign.to_owned()))?;
        self.selected = Some(id);
        debug!(callsign, %id, "Aircraft selected");
        Ok(id)
    }

    /// Drop the current selection.
    pub const fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The selected aircraft, if it is still in the fleet.
    pub fn selected(&self) -> Option<&Aircraft> {
        let id = self.selected?;
        self.fleet.iter().find(|aircraft| aircraft.id == id)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply a command to the selected aircraft.
    ///
    /// Every outcome is logged. A rejected command changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NoSelection`] or
    /// [`CommandError::StaleSelection`] when there is no live selection,
    /// [`CommandError::Diverting`] when the selection is diverting, and
    /// [`CommandError::RunwayBusy`] when the runway is reserved.
    pub fn apply_command(&mut self, command: &Command) -> Result<(), CommandError> {
        let idx = self.selected_index()?;
        let now = self.time.now();
        let tick = self.clock.tick();

        let Some(aircraft) = self.fleet.get_mut(idx) else {
            return Err(CommandError::StaleSelection);
        };
        let mut ctx = DispatchContext {
            geography: &self.geography,
            scheduler: &mut self.scheduler,
            runways: &self.config.runways,
            now,
        };
        match dispatch(aircraft, command, &mut ctx) {
            Ok(notice) => {
                self.events.record_notice(tick, now, notice);
                Ok(())
            }
            Err(err) => {
                let notice = match &err {
                    CommandError::RunwayBusy {
                        runway,
                        remaining_secs,
                    } => Notice::warning(format!(
                        "{} - Runway {runway} in use, clear in {remaining_secs}s",
                        aircraft.callsign
                    )),
                    other => Notice::error(format!("{} - {other}", aircraft.callsign)),
                };
                self.events.record_notice(tick, now, notice);
                Err(err)
            }
        }
    }

    /// Parse a raw `(command, value)` pair and apply it to the selection.
    ///
    /// # Errors
    ///
    /// Returns the selection error first, then any parse error, then any
    /// error from [`apply_command`](Self::apply_command).
    pub fn apply_raw(&mut self, name: &str, value: &str) -> Result<(), CommandError> {
        self.selected_index()?;
        match Command::parse(name, value, &self.geography) {
            Ok(command) => self.apply_command(&command),
            Err(err) => {
                self.log(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Index of the live selection. Logs and clears a missing or stale one.
    fn selected_index(&mut self) -> Result<usize, CommandError> {
        let Some(id) = self.selected else {
            self.log(Notice::error("No aircraft selected"));
            return Err(CommandError::NoSelection);
        };
        if let Some(idx) = self.fleet.iter().position(|aircraft| aircraft.id == id) {
            Ok(idx)
        } else {
            self.selected = None;
            self.log(Notice::error("No aircraft selected"));
            Err(CommandError::StaleSelection)
        }
    }

    fn log(&mut self, notice: Notice) {
        let now = self.time.now();
        self.events.record_notice(self.clock.tick(), now, notice);
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    /// The whole fleet, in roster order.
    pub fn aircraft(&self) -> &[Aircraft] {
        &self.fleet
    }

    /// Look up an aircraft by callsign.
    pub fn find(&self, callsign: &str) -> Option<&Aircraft> {
        self.fleet
            .iter()
            .find(|aircraft| aircraft.callsign == callsign)
    }

    /// Aircraft currently airborne.
    pub fn flights_in_air(&self) -> impl Iterator<Item = &Aircraft> {
        self.fleet.iter().filter(|aircraft| aircraft.is_in_air)
    }

    /// Aircraft currently on the ground.
    pub fn flights_on_ground(&self) -> impl Iterator<Item = &Aircraft> {
        self.fleet.iter().filter(|aircraft| !aircraft.is_in_air)
    }

    /// Per-runway reservation view.
    pub fn runway_status(&self) -> Vec<RunwayStatus> {
        self.scheduler
            .status(self.geography.runway_codes(), self.time.now())
    }

    /// Read-only copy of everything a renderer or panel needs.
    pub fn snapshot(&self) -> EngineSnapshot {
        let now = self.time.now();
        EngineSnapshot {
            tick: self.clock.tick(),
            taken_at: now,
            elapsed_ms: self.clock.elapsed(now).num_milliseconds(),
            aircraft: self
                .fleet
                .iter()
                .map(|aircraft| aircraft.snapshot(self.selected == Some(aircraft.id)))
                .collect(),
            runways: self.scheduler.status(self.geography.runway_codes(), now),
            selected: self.selected().map(|aircraft| aircraft.id),
            active_emergencies: self.emergencies.active(),
        }
    }

    /// The activity log.
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Runway reservations.
    pub const fn scheduler(&self) -> &RunwayScheduler {
        &self.scheduler
    }

    /// Number of emergencies currently active.
    pub const fn active_emergencies(&self) -> u32 {
        self.emergencies.active()
    }

    /// Airport geography.
    pub const fn geography(&self) -> &Geography {
        &self.geography
    }

    /// Effective configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Tick counter and start instant.
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Current instant according to the engine's time source.
    pub fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    /// Forward every future log entry to `sink`.
    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.events.set_sink(sink);
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atcsim_types::{Point, Severity, WeightClass};
    use chrono::TimeDelta;

    use super::*;
    use crate::clock::ManualTimeSource;

    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.simulation.seed = Some(7);
        config.emergencies.windshear_probability = 0.0;
        config
    }

    fn engine_with(
        fleet: Vec<Aircraft>,
    ) -> (SimulationEngine<ManualTimeSource>, ManualTimeSource) {
        let time = ManualTimeSource::at_epoch();
        let engine = SimulationEngine::with_fleet(quiet_config(), fleet, time.clone()).unwrap();
        (engine, time)
    }

    fn inbound(callsign: &str, at: Point) -> Aircraft {
        Aircraft::airborne(callsign, WeightClass::Regular, "A320", at)
    }

    #[test]
    fn new_spawns_configured_roster() {
        let engine =
            SimulationEngine::new(quiet_config(), ManualTimeSource::at_epoch()).unwrap();
        assert_eq!(engine.aircraft().len(), 8);
        assert_eq!(
            engine.flights_in_air().count() + engine.flights_on_ground().count(),
            8
        );
        assert_eq!(
            engine.events().latest().map(|e| e.message.as_str()),
            Some("ATC Simulator initialized")
        );
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let mut config = quiet_config();
        config.airport.runways.clear();
        assert!(matches!(
            SimulationEngine::new(config, ManualTimeSource::at_epoch()),
            Err(SetupError::World { .. })
        ));
    }

    #[test]
    fn command_without_selection_is_logged() {
        let (mut engine, _) = engine_with(vec![inbound("AAL123", Point::new(0.0, 0.0))]);
        assert_eq!(
            engine.apply_command(&Command::Hold),
            Err(CommandError::NoSelection)
        );
        let latest = engine.events().latest().unwrap();
        assert_eq!(latest.severity, Severity::Error);
        assert_eq!(latest.message, "No aircraft selected");
    }

    #[test]
    fn select_is_case_insensitive_and_rejects_unknown() {
        let (mut engine, _) = engine_with(vec![inbound("AAL123", Point::new(0.0, 0.0))]);
        assert!(engine.select("aal123").is_ok());
        assert_eq!(engine.selected().map(|a| a.callsign.as_str()), Some("AAL123"));
        assert_eq!(
            engine.select("ZZZ999"),
            Err(CommandError::UnknownCallsign(String::from("ZZZ999")))
        );
        assert!(engine.selected().is_some());
        engine.clear_selection();
        assert!(engine.selected().is_none());
    }

    #[test]
    fn busy_runway_logs_remaining_seconds() {
        let (mut engine, time) = engine_with(vec![
            inbound("AAL123", Point::new(0.0, 0.0)),
            inbound("UAL789", Point::new(10.0, 0.0)),
        ]);
        engine.select("AAL123").unwrap();
        engine.apply_raw("runway", "06").unwrap();

        time.advance(TimeDelta::milliseconds(17_500));
        engine.select("UAL789").unwrap();
        let err = engine.apply_raw("runway", "06").unwrap_err();
        assert!(matches!(err, CommandError::RunwayBusy { remaining_secs: 43, .. }));
        let latest = engine.events().latest().unwrap();
        assert_eq!(latest.severity, Severity::Warning);
        assert_eq!(latest.message, "UAL789 - Runway 06 in use, clear in 43s");
        assert_eq!(engine.find("UAL789").unwrap().assigned_runway, None);
    }

    #[test]
    fn unknown_target_is_a_logged_no_op() {
        let (mut engine, _) = engine_with(vec![inbound("AAL123", Point::new(0.0, 0.0))]);
        engine.select("AAL123").unwrap();
        let before = engine.find("AAL123").cloned();
        assert!(engine.apply_raw("runway", "99").is_err());
        assert_eq!(engine.find("AAL123").cloned(), before);
        assert_eq!(
            engine.events().latest().map(|e| e.severity),
            Some(Severity::Error)
        );
    }

    #[test]
    fn landed_aircraft_departs_after_taxi_in() {
        let (mut engine, time) =
            engine_with(vec![inbound("AAL123", Point::new(1030.0, 629.0))]);
        engine.select("AAL123").unwrap();
        // Skip the approach: put the aircraft on short final.
        engine.apply_raw("runway", "06").unwrap();
        {
            let aircraft = engine.fleet.first_mut().unwrap();
            aircraft.status = AircraftStatus::Landing;
            aircraft.destination = Some(Point::new(1034.0, 629.0));
        }

        let summary = engine.tick().unwrap();
        assert_eq!(summary.arrivals, 1);
        assert_eq!(engine.find("AAL123").unwrap().status, AircraftStatus::Taxiing);

        time.advance(TimeDelta::seconds(5));
        let summary = engine.tick().unwrap();
        assert!(summary.departed.is_empty());

        time.advance(TimeDelta::milliseconds(1));
        let summary = engine.tick().unwrap();
        assert_eq!(summary.departed, vec![String::from("AAL123")]);
        assert!(engine.aircraft().is_empty());
        assert!(engine.selected().is_none());
        assert_eq!(
            engine.events().latest().map(|e| e.message.as_str()),
            Some("AAL123 taxied to gate and departed")
        );

        // The selection went with it.
        assert_eq!(
            engine.apply_command(&Command::Hold),
            Err(CommandError::NoSelection)
        );
    }

    #[test]
    fn snapshot_reflects_selection_and_reservations() {
        let (mut engine, time) = engine_with(vec![
            Aircraft::grounded(
                "DAL456",
                WeightClass::Heavy,
                "B777",
                Point::new(1031.0, 670.0),
                None,
            ),
        ]);
        engine.select("DAL456").unwrap();
        engine.apply_raw("runway-takeoff", "06").unwrap();
        time.advance(TimeDelta::seconds(60));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.aircraft.len(), 1);
        assert!(snapshot.aircraft.first().unwrap().selected);
        assert_eq!(snapshot.aircraft.first().unwrap().location, "Runway 06");
        assert_eq!(snapshot.elapsed_ms, 60_000);
        let r06 = snapshot
            .runways
            .iter()
            .find(|r| r.runway.as_str() == "06")
            .unwrap();
        assert_eq!(r06.remaining_secs, 120);
        assert_eq!(snapshot.runways.len(), 4);
        assert_eq!(engine.runway_status(), snapshot.runways);
    }
}
