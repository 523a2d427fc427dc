//! Command dispatcher.
//!
//! Applies a validated [`Command`] to one aircraft. Runway clearances
//! consult and update the [`RunwayScheduler`]; a busy runway rejects the
//! command with no state change. A diverting aircraft refuses every
//! command. Every other command always succeeds.
//!
//! | command          | destination       | status              | runway   |
//! |------------------|-------------------|---------------------|----------|
//! | `runway`         | approach anchor   | `approaching`, air  | assigned |
//! | `runway-takeoff` | runway threshold  | `taking-off`        | assigned |
//! | `taxi`           | waiting point     | `taxing`            | cleared  |
//! | `hold`           | none              | `waiting`           | cleared  |
//! | `wait-airspace`  | none              | `waiting`           | cleared  |

use atcsim_aircraft::Aircraft;
use atcsim_types::{AircraftStatus, RunwayCode};
use atcsim_world::Geography;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::command::{Command, CommandError};
use crate::config::RunwayConfig;
use crate::events::Notice;
use crate::scheduler::RunwayScheduler;

/// Shared state a command may touch besides the aircraft itself.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    /// Airport geography.
    pub geography: &'a Geography,
    /// Runway reservations.
    pub scheduler: &'a mut RunwayScheduler,
    /// Reservation durations.
    pub runways: &'a RunwayConfig,
    /// Current instant.
    pub now: DateTime<Utc>,
}

/// Apply `command` to `aircraft`. Returns the notice to log on success.
///
/// # Errors
///
/// Returns [`CommandError::Diverting`] if the aircraft has left tower
/// control, [`CommandError::RunwayBusy`] if a runway clearance targets a
/// reserved runway, or [`CommandError::UnknownRunway`] /
/// [`CommandError::UnknownWaitingPoint`] if the target has no coordinate.
/// The aircraft and the scheduler are untouched on error.
pub fn dispatch(
    aircraft: &mut Aircraft,
    command: &Command,
    ctx: &mut DispatchContext<'_>,
) -> Result<Notice, CommandError> {
    if aircraft.status.is_terminal() {
        return Err(CommandError::Diverting);
    }
    let callsign = aircraft.callsign.clone();

    let notice = match command {
        Command::ClearLanding { runway } => {
            let approach = ctx
                .geography
                .approach_point(runway)
                .ok_or_else(|| CommandError::UnknownRunway(runway.to_string()))?;
            reserve(aircraft, runway, ctx)?;
            aircraft.destination = Some(approach);
            aircraft.status = AircraftStatus::Approaching;
            aircraft.is_in_air = true;
            aircraft.assigned_runway = Some(runway.clone());
            Notice::success(format!("{callsign} cleared to land on runway {runway}"))
        }
        Command::ClearTakeoff { runway } => {
            let threshold = ctx
                .geography
                .runway_point(runway)
                .ok_or_else(|| CommandError::UnknownRunway(runway.to_string()))?;
            reserve(aircraft, runway, ctx)?;
            aircraft.destination = Some(threshold);
            aircraft.status = AircraftStatus::TakingOff;
            aircraft.assigned_runway = Some(runway.clone());
            Notice::success(format!("{callsign} cleared for takeoff from runway {runway}"))
        }
        Command::Taxi { point } => {
            let target = ctx
                .geography
                .waiting_point(point)
                .ok_or_else(|| CommandError::UnknownWaitingPoint(point.to_string()))?;
            aircraft.destination = Some(target);
            aircraft.status = AircraftStatus::Taxiing;
            aircraft.assigned_waiting_point = Some(point.clone());
            aircraft.assigned_runway = None;
            Notice::success(format!("{callsign} cleared to taxi to {point}"))
        }
        Command::Hold => {
            stop(aircraft);
            Notice::warning(format!("{callsign} instructed to hold"))
        }
        Command::WaitAirspace => {
            stop(aircraft);
            Notice::warning(format!("{callsign} cleared to wait in airspace"))
        }
    };

    debug!(
        callsign = %callsign,
        command = command.name(),
        status = %aircraft.status,
        "Command applied"
    );
    Ok(notice)
}

/// Check the runway and reserve it for this aircraft's weight class.
fn reserve(
    aircraft: &Aircraft,
    runway: &RunwayCode,
    ctx: &mut DispatchContext<'_>,
) -> Result<(), CommandError> {
    if !ctx.scheduler.is_free(runway, ctx.now) {
        return Err(CommandError::RunwayBusy {
            runway: runway.clone(),
            remaining_secs: ctx.scheduler.remaining_secs(runway, ctx.now),
        });
    }
    let until = ctx.scheduler.reserve(
        runway.clone(),
        ctx.now,
        ctx.runways.reservation_for(aircraft.weight_class),
    );
    debug!(
        callsign = %aircraft.callsign,
        runway = %runway,
        weight_class = %aircraft.weight_class,
        %until,
        "Runway reserved"
    );
    Ok(())
}

fn stop(aircraft: &mut Aircraft) {
    aircraft.status = AircraftStatus::Waiting;
    aircraft.destination = None;
    aircraft.assigned_runway = None;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atcsim_types::{Point, Severity, WaitingPointCode, WeightClass};
    use chrono::TimeDelta;

    use super::*;

    fn t(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(ms)
    }

    fn regular() -> Aircraft {
        Aircraft::airborne("AAL123", WeightClass::Regular, "A320", Point::new(0.0, 0.0))
    }

    fn heavy() -> Aircraft {
        Aircraft::grounded(
            "DAL456",
            WeightClass::Heavy,
            "B777",
            Point::new(1031.0, 670.0),
            None,
        )
    }

    fn r(code: &str) -> RunwayCode {
        RunwayCode::from(code)
    }

    struct Fixture {
        geography: Geography,
        scheduler: RunwayScheduler,
        runways: RunwayConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                geography: Geography::default(),
                scheduler: RunwayScheduler::new(),
                runways: RunwayConfig::default(),
            }
        }

        fn run(
            &mut self,
            aircraft: &mut Aircraft,
            command: &Command,
            now: DateTime<Utc>,
        ) -> Result<Notice, CommandError> {
            let mut ctx = DispatchContext {
                geography: &self.geography,
                scheduler: &mut self.scheduler,
                runways: &self.runways,
                now,
            };
            dispatch(aircraft, command, &mut ctx)
        }
    }

    #[test]
    fn landing_clearance_targets_approach_anchor() {
        let mut fx = Fixture::new();
        let mut aircraft = regular();
        let notice = fx
            .run(&mut aircraft, &Command::ClearLanding { runway: r("06") }, t(0))
            .unwrap();
        assert_eq!(notice.severity, Severity::Success);
        assert_eq!(notice.message, "AAL123 cleared to land on runway 06");
        assert_eq!(aircraft.destination, Some(Point::new(934.0, 629.0)));
        assert_eq!(aircraft.status, AircraftStatus::Approaching);
        assert!(aircraft.is_in_air);
        assert_eq!(aircraft.assigned_runway, Some(r("06")));
        assert_eq!(fx.scheduler.reserved_until(&r("06")), Some(t(60_000)));
    }

    #[test]
    fn heavy_takeoff_reserves_three_minutes() {
        let mut fx = Fixture::new();
        let mut aircraft = heavy();
        let notice = fx
            .run(&mut aircraft, &Command::ClearTakeoff { runway: r("24") }, t(1_000))
            .unwrap();
        assert_eq!(notice.message, "DAL456 cleared for takeoff from runway 24");
        assert_eq!(aircraft.status, AircraftStatus::TakingOff);
        assert_eq!(aircraft.destination, Some(Point::new(1891.0, 629.0)));
        assert_eq!(fx.scheduler.reserved_until(&r("24")), Some(t(181_000)));
    }

    #[test]
    fn busy_runway_rejects_without_mutation() {
        let mut fx = Fixture::new();
        let mut first = regular();
        let mut second = heavy();
        fx.run(&mut first, &Command::ClearLanding { runway: r("06") }, t(0))
            .unwrap();

        let before = second.clone();
        let err = fx
            .run(&mut second, &Command::ClearTakeoff { runway: r("06") }, t(30_000))
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::RunwayBusy {
                runway: r("06"),
                remaining_secs: 30
            }
        );
        assert_eq!(second, before);
        assert_eq!(fx.scheduler.reserved_until(&r("06")), Some(t(60_000)));
    }

    #[test]
    fn runway_frees_when_reservation_lapses() {
        let mut fx = Fixture::new();
        let mut first = regular();
        let mut second = heavy();
        fx.run(&mut first, &Command::ClearLanding { runway: r("07") }, t(0))
            .unwrap();
        fx.run(&mut second, &Command::ClearTakeoff { runway: r("07") }, t(60_000))
            .unwrap();
        assert_eq!(second.assigned_runway, Some(r("07")));
    }

    #[test]
    fn taxi_sets_waiting_point_and_drops_runway() {
        let mut fx = Fixture::new();
        let mut aircraft = heavy();
        aircraft.assigned_runway = Some(r("25"));
        let point = WaitingPointCode::from("A7");
        fx.run(&mut aircraft, &Command::Taxi { point: point.clone() }, t(0))
            .unwrap();
        assert_eq!(aircraft.status, AircraftStatus::Taxiing);
        assert_eq!(aircraft.destination, Some(Point::new(1900.0, 1111.0)));
        assert_eq!(aircraft.assigned_waiting_point, Some(point));
        assert_eq!(aircraft.assigned_runway, None);
    }

    #[test]
    fn hold_and_wait_stop_the_aircraft() {
        let mut fx = Fixture::new();
        for command in [Command::Hold, Command::WaitAirspace] {
            let mut aircraft = regular();
            aircraft.destination = Some(Point::new(5.0, 5.0));
            aircraft.assigned_runway = Some(r("06"));
            let notice = fx.run(&mut aircraft, &command, t(0)).unwrap();
            assert_eq!(notice.severity, Severity::Warning);
            assert_eq!(aircraft.status, AircraftStatus::Waiting);
            assert_eq!(aircraft.destination, None);
            assert_eq!(aircraft.assigned_runway, None);
        }
    }

    #[test]
    fn diverting_aircraft_refuses_every_command() {
        let mut fx = Fixture::new();
        let mut aircraft = regular();
        aircraft.status = AircraftStatus::Diverting;
        aircraft.go_around_attempts = 3;
        aircraft.destination = Some(Point::new(-100.0, -100.0));
        let before = aircraft.clone();

        for command in [
            Command::ClearLanding { runway: r("06") },
            Command::ClearTakeoff { runway: r("24") },
            Command::Taxi {
                point: WaitingPointCode::from("C1"),
            },
            Command::Hold,
            Command::WaitAirspace,
        ] {
            assert_eq!(
                fx.run(&mut aircraft, &command, t(0)),
                Err(CommandError::Diverting)
            );
        }
        assert_eq!(aircraft, before);
        assert_eq!(fx.scheduler.reserved_until(&r("06")), None);
        assert_eq!(fx.scheduler.reserved_until(&r("24")), None);
    }
}
