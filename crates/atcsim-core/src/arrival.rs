//! Arrival and transition handler.
//!
//! Runs for every aircraft whose motion step reported an arrival this
//! tick and drives the status machine forward:
//!
//! ```text
//! approaching --arrive--> landing --touchdown--> taxing (taxi-in, 5 s)
//!                            |  ^
//!                  windshear |  | arrive
//!                            v  |
//!                          go-around --exhausted--> diverting (terminal)
//!
//! taking-off --arrive--> airborne
//! taxing (outbound) --arrive--> ready-for-takeoff
//! ```
//!
//! Windshear is rolled once per touchdown attempt. Landed aircraft keep
//! `taxing` until the taxi-in deadline removes them from the fleet.

use atcsim_aircraft::Aircraft;
use atcsim_types::AircraftStatus;
use atcsim_world::Geography;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::TaxiConfig;
use crate::emergency::EmergencyGenerator;
use crate::events::Notice;

/// Everything a transition may read or update besides the aircraft.
#[derive(Debug)]
pub struct ArrivalContext<'a> {
    /// Airport geography.
    pub geography: &'a Geography,
    /// Taxi-in, go-around, and diversion geometry.
    pub taxi: &'a TaxiConfig,
    /// Chance of windshear on a touchdown attempt.
    pub windshear_probability: f64,
    /// Active-emergency counter, decremented when a landing resolves one.
    pub emergencies: &'a mut EmergencyGenerator,
    /// Current instant.
    pub now: DateTime<Utc>,
}

/// Apply the transition for an aircraft that just reached its destination.
/// Returns the notices to log.
pub fn handle_arrival<R: Rng + ?Sized>(
    aircraft: &mut Aircraft,
    ctx: &mut ArrivalContext<'_>,
    rng: &mut R,
) -> Vec<Notice> {
    let from = aircraft.status;
    let notices = match from {
        AircraftStatus::Approaching => begin_final(aircraft, ctx),
        AircraftStatus::Landing => touchdown(aircraft, ctx, rng),
        AircraftStatus::GoAround => reattempt(aircraft, ctx),
        AircraftStatus::TakingOff => {
            let runway = aircraft
                .assigned_runway
                .take()
                .map_or_else(String::new, |r| r.to_string());
            aircraft.status = AircraftStatus::Airborne;
            aircraft.is_in_air = true;
            vec![Notice::success(format!(
                "{} airborne from runway {runway}",
                aircraft.callsign
            ))]
        }
        AircraftStatus::Taxiing if aircraft.taxi_deadline.is_none() => {
            aircraft.status = AircraftStatus::ReadyForTakeoff;
            let point = aircraft
                .assigned_waiting_point
                .as_ref()
                .map_or_else(String::new, ToString::to_string);
            vec![Notice::success(format!(
                "{} reached waiting point {point}",
                aircraft.callsign
            ))]
        }
        // Landed aircraft roll on until the taxi-in deadline removes them.
        AircraftStatus::Taxiing
        | AircraftStatus::Diverting
        | AircraftStatus::ReadyForTakeoff
        | AircraftStatus::Airborne
        | AircraftStatus::Waiting
        | AircraftStatus::OnGround => Vec::new(),
    };

    if aircraft.status != from {
        info!(
            callsign = %aircraft.callsign,
            %from,
            to = %aircraft.status,
            "Status transition"
        );
    }
    notices
}

fn begin_final(aircraft: &mut Aircraft, ctx: &ArrivalContext<'_>) -> Vec<Notice> {
    let Some(runway) = aircraft.assigned_runway.clone() else {
        debug!(callsign = %aircraft.callsign, "Approach anchor reached without a runway");
        return Vec::new();
    };
    let Some(threshold) = ctx.geography.runway_point(&runway) else {
        warn!(callsign = %aircraft.callsign, %runway, "Assigned runway has no threshold");
        return Vec::new();
    };
    aircraft.status = AircraftStatus::Landing;
    aircraft.destination = Some(threshold);
    aircraft.is_in_air = false;
    vec![Notice::info(format!(
        "{} starting final approach to runway {runway}",
        aircraft.callsign
    ))]
}

fn touchdown<R: Rng + ?Sized>(
    aircraft: &mut Aircraft,
    ctx: &mut ArrivalContext<'_>,
    rng: &mut R,
) -> Vec<Notice> {
    let callsign = aircraft.callsign.clone();

    if rng.random_bool(ctx.windshear_probability) {
        aircraft.has_windshear = true;
        aircraft.go_around_attempts = aircraft.go_around_attempts.saturating_add(1);
        let mut notices = vec![Notice::warning(format!(
            "\u{26a0}\u{fe0f} WINDSHEAR: {callsign} experiencing windshear, initiating go-around!"
        ))];

        if aircraft.go_arounds_exhausted() {
            aircraft.status = AircraftStatus::Diverting;
            aircraft.destination = Some(ctx.taxi.divert_point);
            aircraft.assigned_runway = None;
            notices.push(Notice::warning(format!(
                "{callsign} exceeded maximum go-around attempts, diverting to alternate airport"
            )));
        } else {
            let offset = ctx.taxi.go_around_offset;
            aircraft.status = AircraftStatus::GoAround;
            aircraft.destination = Some(aircraft.position.offset(-offset, -offset));
        }
        aircraft.is_in_air = true;
        info!(
            callsign = %callsign,
            attempts = aircraft.go_around_attempts,
            max = aircraft.max_go_arounds,
            "Windshear on touchdown"
        );
        return notices;
    }

    let runway = aircraft.assigned_runway.take();
    aircraft.status = AircraftStatus::Taxiing;
    aircraft.is_in_air = false;
    aircraft.taxi_deadline = ctx.now.checked_add_signed(ctx.taxi.taxi_in());
    aircraft.destination = runway
        .as_ref()
        .and_then(|r| ctx.geography.opposite(r))
        .and_then(|opposite| ctx.geography.runway_point(opposite));

    let notice = if let Some(kind) = aircraft.emergency.take() {
        aircraft.emergency_started_at = None;
        ctx.emergencies.resolve();
        Notice::success(format!(
            "{callsign} successfully landed despite {kind} - emergency resolved, taxiing to gate"
        ))
    } else {
        let runway = runway.map_or_else(String::new, |r| r.to_string());
        Notice::success(format!(
            "{callsign} successfully landed on runway {runway}, taxiing to gate"
        ))
    };
    vec![notice]
}

fn reattempt(aircraft: &mut Aircraft, ctx: &ArrivalContext<'_>) -> Vec<Notice> {
    let Some(runway) = aircraft.assigned_runway.clone() else {
        debug!(callsign = %aircraft.callsign, "Go-around point reached without a runway");
        return Vec::new();
    };
    let Some(threshold) = ctx.geography.runway_point(&runway) else {
        return Vec::new();
    };
    aircraft.status = AircraftStatus::Landing;
    aircraft.destination = Some(threshold);
    vec![Notice::warning(format!(
        "{} re-attempting landing on runway {runway}",
        aircraft.callsign
    ))]
}
