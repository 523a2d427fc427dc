//! End-to-end scenarios driving a [`SimulationEngine`] tick by tick with a
//! manual clock.
#![allow(clippy::unwrap_used, clippy::panic)]

use atcsim_aircraft::Aircraft;
use atcsim_core::{CommandError, ManualTimeSource, SimulationConfig, SimulationEngine};
use atcsim_types::{AircraftStatus, Point, RunwayCode, WaitingPointCode, WeightClass};
use chrono::{DateTime, TimeDelta, Utc};

type Engine = SimulationEngine<ManualTimeSource>;

fn config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.simulation.seed = Some(42);
    config.emergencies.windshear_probability = 0.0;
    config.emergencies.initial_delay_secs = 100_000;
    config
}

fn build(config: SimulationConfig, fleet: Vec<Aircraft>) -> (Engine, ManualTimeSource) {
    let time = ManualTimeSource::at_epoch();
    let engine = SimulationEngine::with_fleet(config, fleet, time.clone()).unwrap();
    (engine, time)
}

fn inbound(callsign: &str, class: WeightClass, at: Point) -> Aircraft {
    Aircraft::airborne(callsign, class, "A320", at)
}

fn parked(callsign: &str, class: WeightClass, point: &str, at: Point) -> Aircraft {
    Aircraft::grounded(
        callsign,
        class,
        "B737",
        at,
        Some(WaitingPointCode::from(point)),
    )
}

fn epoch_plus(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(millis)
}

fn status_of(engine: &Engine, callsign: &str) -> AircraftStatus {
    engine.find(callsign).unwrap().status
}

/// Tick until `done` holds, failing after `limit` ticks. Returns the
/// number of ticks taken.
fn tick_until(engine: &mut Engine, limit: u32, mut done: impl FnMut(&Engine) -> bool) -> u32 {
    for n in 1..=limit {
        engine.tick().unwrap();
        if done(engine) {
            return n;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

fn logged(engine: &Engine, needle: &str) -> bool {
    engine.events().iter().any(|e| e.message.contains(needle))
}

#[test]
fn runway_is_exclusive_until_reservation_lapses() {
    let (mut engine, time) = build(
        config(),
        vec![
            inbound("AAL123", WeightClass::Regular, Point::new(0.0, 0.0)),
            inbound("UAL789", WeightClass::Regular, Point::new(50.0, 0.0)),
            parked("SWA101", WeightClass::Regular, "C1", Point::new(1031.0, 670.0)),
        ],
    );

    engine.select("AAL123").unwrap();
    engine.apply_raw("runway", "06").unwrap();

    time.advance(TimeDelta::seconds(30));
    engine.select("UAL789").unwrap();
    assert_eq!(
        engine.apply_raw("runway", "06"),
        Err(CommandError::RunwayBusy {
            runway: RunwayCode::from("06"),
            remaining_secs: 30,
        })
    );
    engine.select("SWA101").unwrap();
    assert!(matches!(
        engine.apply_raw("runway-takeoff", "06"),
        Err(CommandError::RunwayBusy { .. })
    ));
    assert_eq!(status_of(&engine, "SWA101"), AircraftStatus::ReadyForTakeoff);

    // Other runways are unaffected.
    engine.apply_raw("runway-takeoff", "24").unwrap();

    time.advance(TimeDelta::seconds(30));
    engine.select("UAL789").unwrap();
    engine.apply_raw("runway", "06").unwrap();
    assert_eq!(status_of(&engine, "UAL789"), AircraftStatus::Approaching);
    assert_eq!(
        engine.scheduler().reserved_until(&RunwayCode::from("06")),
        Some(epoch_plus(120_000))
    );
}

#[test]
fn reservation_length_follows_weight_class() {
    let (mut engine, _time) = build(
        config(),
        vec![
            inbound("BAW999", WeightClass::Heavy, Point::new(0.0, 0.0)),
            inbound("AAL123", WeightClass::Regular, Point::new(0.0, 50.0)),
            parked("DAL456", WeightClass::Heavy, "A1", Point::new(1030.0, 1111.0)),
            parked("SWA101", WeightClass::Regular, "C8", Point::new(1899.0, 670.0)),
        ],
    );

    let cases = [
        ("BAW999", "runway", "07", 180_000),
        ("AAL123", "runway", "06", 60_000),
        ("DAL456", "runway-takeoff", "25", 180_000),
        ("SWA101", "runway-takeoff", "24", 60_000),
    ];
    for (callsign, command, runway, millis) in cases {
        engine.select(callsign).unwrap();
        engine.apply_raw(command, runway).unwrap();
        assert_eq!(
            engine.scheduler().reserved_until(&RunwayCode::from(runway)),
            Some(epoch_plus(millis)),
            "{callsign} on {runway}"
        );
    }
}

#[test]
fn clean_arrival_lands_taxis_and_departs() {
    let (mut engine, time) = build(
        config(),
        vec![inbound("AAL123", WeightClass::Regular, Point::new(900.0, 629.0))],
    );
    engine.select("AAL123").unwrap();
    engine.apply_raw("runway", "06").unwrap();

    tick_until(&mut engine, 100, |e| {
        status_of(e, "AAL123") == AircraftStatus::Landing
    });
    assert!(logged(&engine, "AAL123 starting final approach to runway 06"));
    let landing = engine.find("AAL123").unwrap();
    assert!(!landing.is_in_air);
    assert_eq!(landing.destination, Some(Point::new(1034.0, 629.0)));

    tick_until(&mut engine, 500, |e| {
        status_of(e, "AAL123") == AircraftStatus::Taxiing
    });
    assert!(logged(
        &engine,
        "AAL123 successfully landed on runway 06, taxiing to gate"
    ));
    let landed = engine.find("AAL123").unwrap();
    assert_eq!(landed.assigned_runway, None);
    assert_eq!(landed.destination, Some(Point::new(1891.0, 629.0)));
    assert_eq!(landed.taxi_deadline, Some(epoch_plus(5_000)));

    time.advance(TimeDelta::seconds(6));
    let summary = engine.tick().unwrap();
    assert_eq!(summary.departed, vec![String::from("AAL123")]);
    assert!(engine.aircraft().is_empty());
}

#[test]
fn outbound_flow_taxis_then_takes_off() {
    let (mut engine, _time) = build(
        config(),
        vec![parked("SWA101", WeightClass::Regular, "C1", Point::new(1031.0, 670.0))],
    );
    engine.select("SWA101").unwrap();
    engine.apply_raw("taxi", "C2").unwrap();
    assert_eq!(status_of(&engine, "SWA101"), AircraftStatus::Taxiing);

    tick_until(&mut engine, 200, |e| {
        status_of(e, "SWA101") == AircraftStatus::ReadyForTakeoff
    });
    assert!(logged(&engine, "SWA101 reached waiting point C2"));

    engine.apply_raw("runway-takeoff", "06").unwrap();
    tick_until(&mut engine, 200, |e| {
        status_of(e, "SWA101") == AircraftStatus::Airborne
    });
    let airborne = engine.find("SWA101").unwrap();
    assert!(airborne.is_in_air);
    assert_eq!(airborne.assigned_runway, None);
    assert!(logged(&engine, "SWA101 airborne from runway 06"));
}

#[test]
fn windshear_goes_around_then_diverts_after_limit() {
    let mut config = config();
    config.emergencies.windshear_probability = 1.0;
    let (mut engine, _time) = build(
        config,
        vec![inbound("AAL123", WeightClass::Regular, Point::new(900.0, 629.0))],
    );
    engine.select("AAL123").unwrap();
    engine.apply_raw("runway", "06").unwrap();

    tick_until(&mut engine, 1_000, |e| {
        status_of(e, "AAL123") == AircraftStatus::GoAround
    });
    let first = engine.find("AAL123").unwrap();
    assert_eq!(first.go_around_attempts, 1);
    assert!(first.has_windshear);
    assert!(first.is_in_air);
    // Climb-out point is offset from the touchdown point.
    assert_eq!(first.destination, Some(Point::new(934.0, 529.0)));
    assert_eq!(first.assigned_runway, Some(RunwayCode::from("06")));

    tick_until(&mut engine, 5_000, |e| {
        status_of(e, "AAL123") == AircraftStatus::Diverting
    });
    let diverted = engine.find("AAL123").unwrap();
    assert_eq!(diverted.go_around_attempts, 3);
    assert_eq!(diverted.assigned_runway, None);
    assert_eq!(diverted.destination, Some(Point::new(-400.0, -400.0)));
    assert!(logged(
        &engine,
        "AAL123 exceeded maximum go-around attempts, diverting to alternate airport"
    ));
    assert!(logged(&engine, "AAL123 re-attempting landing on runway 06"));

    // Diverting is terminal: the aircraft flies off and stays there.
    for _ in 0..2_000 {
        engine.tick().unwrap();
    }
    let parked_out = engine.find("AAL123").unwrap();
    assert_eq!(parked_out.status, AircraftStatus::Diverting);
    assert_eq!(parked_out.position, Point::new(-400.0, -400.0));
}

#[test]
fn diverting_aircraft_cannot_be_cleared_back_in() {
    let mut config = config();
    config.emergencies.windshear_probability = 1.0;
    let mut diverted = inbound("AAL123", WeightClass::Regular, Point::new(900.0, 629.0));
    diverted.status = AircraftStatus::Diverting;
    diverted.go_around_attempts = 3;
    diverted.destination = Some(Point::new(-400.0, -400.0));
    let (mut engine, _time) = build(config, vec![diverted]);
    engine.select("AAL123").unwrap();

    for (command, value) in [
        ("runway", "06"),
        ("runway-takeoff", "24"),
        ("taxi", "C1"),
        ("hold", ""),
        ("wait-airspace", ""),
    ] {
        assert_eq!(
            engine.apply_raw(command, value),
            Err(CommandError::Diverting),
            "{command}"
        );
    }
    assert!(logged(
        &engine,
        "AAL123 - diverting, no longer under tower control"
    ));
    let aircraft = engine.find("AAL123").unwrap();
    assert_eq!(aircraft.status, AircraftStatus::Diverting);
    assert_eq!(aircraft.assigned_runway, None);
    assert_eq!(engine.scheduler().reserved_until(&RunwayCode::from("06")), None);

    for _ in 0..3_000 {
        engine.tick().unwrap();
    }
    let aircraft = engine.find("AAL123").unwrap();
    assert_eq!(aircraft.status, AircraftStatus::Diverting);
    assert_eq!(aircraft.go_around_attempts, 3);
}

#[test]
fn emergencies_wait_for_quiet_period_and_respect_capacity() {
    let mut config = config();
    config.emergencies.initial_delay_secs = 20;
    config.emergencies.double_fault_probability = 1.0;
    let fleet = (0..6_u32)
        .map(|i| {
            inbound(
                &format!("TST{i}"),
                WeightClass::Regular,
                Point::new(f64::from(i) * 10.0, 0.0),
            )
        })
        .collect();
    let (mut engine, time) = build(config, fleet);

    for _ in 0..19 {
        time.advance(TimeDelta::seconds(1));
        let summary = engine.tick().unwrap();
        assert_eq!(summary.faults_injected, 0);
    }
    assert_eq!(engine.active_emergencies(), 0);

    time.advance(TimeDelta::seconds(1));
    let summary = engine.tick().unwrap();
    assert_eq!(summary.faults_injected, 2);
    assert_eq!(summary.active_emergencies, 2);
    assert!(logged(&engine, "\u{1f6a8} EMERGENCY: TST"));

    for _ in 0..2_000 {
        time.advance(TimeDelta::seconds(1));
        let summary = engine.tick().unwrap();
        assert!(summary.active_emergencies <= 2);
        let flagged = engine
            .aircraft()
            .iter()
            .filter(|a| a.emergency.is_some())
            .count();
        assert!(flagged <= 2);
    }
}

#[test]
fn landing_resolves_emergency() {
    let mut config = config();
    config.emergencies.initial_delay_secs = 0;
    config.emergencies.double_fault_probability = 0.0;
    let (mut engine, _time) = build(
        config,
        vec![inbound("AAL123", WeightClass::Regular, Point::new(900.0, 629.0))],
    );
    engine.select("AAL123").unwrap();
    engine.apply_raw("runway", "06").unwrap();

    let summary = engine.tick().unwrap();
    assert_eq!(summary.faults_injected, 1);
    assert!(engine.find("AAL123").unwrap().emergency.is_some());

    tick_until(&mut engine, 1_000, |e| {
        status_of(e, "AAL123") == AircraftStatus::Taxiing
    });
    assert_eq!(engine.active_emergencies(), 0);
    assert!(engine.find("AAL123").unwrap().emergency.is_none());
    assert!(logged(&engine, "emergency resolved, taxiing to gate"));
}

#[test]
fn aircraft_converge_on_their_destination() {
    let starts = [
        Point::new(0.0, 0.0),
        Point::new(2000.0, 1500.0),
        Point::new(-300.0, 900.0),
        Point::new(930.0, 631.0),
    ];
    for start in starts {
        let (mut engine, _time) = build(
            config(),
            vec![inbound("AAL123", WeightClass::Regular, start)],
        );
        engine.select("AAL123").unwrap();
        engine.apply_raw("runway", "06").unwrap();

        let distance = start.distance_to(Point::new(934.0, 629.0));
        // At 2 units per tick, plus the snap tick.
        let bound = (distance / 2.0).ceil() + 2.0;
        let taken = tick_until(&mut engine, 2_000, |e| {
            status_of(e, "AAL123") == AircraftStatus::Landing
        });
        assert!(f64::from(taken) <= bound, "{start:?}: {taken} > {bound}");
    }
}

#[test]
fn hold_and_wait_airspace_stop_the_aircraft() {
    let (mut engine, _time) = build(
        config(),
        vec![
            inbound("AAL123", WeightClass::Regular, Point::new(0.0, 0.0)),
            parked("SWA101", WeightClass::Regular, "C1", Point::new(1031.0, 670.0)),
        ],
    );
    engine.select("AAL123").unwrap();
    engine.apply_raw("runway", "06").unwrap();
    engine.tick().unwrap();
    engine.apply_raw("wait-airspace", "").unwrap();
    let held = engine.find("AAL123").unwrap().clone();
    assert_eq!(held.status, AircraftStatus::Waiting);
    assert_eq!(held.destination, None);

    engine.tick().unwrap();
    assert_eq!(engine.find("AAL123").unwrap().position, held.position);

    engine.select("SWA101").unwrap();
    engine.apply_raw("taxi", "C8").unwrap();
    engine.tick().unwrap();
    engine.apply_raw("hold", "").unwrap();
    assert_eq!(status_of(&engine, "SWA101"), AircraftStatus::Waiting);
}
