//! Emergency generator.
//!
//! Polled once per tick. Faults are advisory: they mark an airborne
//! aircraft with an [`EmergencyKind`] but never block a transition. A
//! successful landing resolves the emergency.
//!
//! # Schedule
//!
//! 1. Nothing happens during the quiet period after start.
//! 2. After that, at most one injection pass per check interval. The pass
//!    is consumed even when it injects nothing.
//! 3. A pass needs spare capacity and at least one airborne, fault-free
//!    aircraft.
//! 4. It tries for two faults with the configured probability, otherwise
//!    one, capped by spare capacity and candidate count. Aircraft are
//!    sampled without replacement; each fault kind is uniform.

use atcsim_aircraft::Aircraft;
use atcsim_types::EmergencyKind;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::config::EmergencyConfig;
use crate::events::Notice;

/// Time-gated fault injector and active-emergency counter.
#[derive(Debug, Clone)]
pub struct EmergencyGenerator {
    config: EmergencyConfig,
    last_check: Option<DateTime<Utc>>,
    active: u32,
}

impl EmergencyGenerator {
    /// Create a generator with no active emergencies.
    pub const fn new(config: EmergencyConfig) -> Self {
        Self {
            config,
            last_check: None,
            active: 0,
        }
    }

    /// Number of emergencies currently counted as active.
    pub const fn active(&self) -> u32 {
        self.active
    }

    /// Instant of the last injection pass.
    pub const fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    /// Record that one emergency was resolved.
    pub const fn resolve(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    /// Run one poll. Returns a notice for every fault injected.
    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        fleet: &mut [Aircraft],
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Notice> {
        if now.signed_duration_since(started_at) < self.config.initial_delay() {
            return Vec::new();
        }
        let interval = self.config.check_interval();
        if self
            .last_check
            .is_some_and(|last| now.signed_duration_since(last) < interval)
        {
            return Vec::new();
        }
        self.last_check = Some(now);

        let capacity = self.config.max_active.saturating_sub(self.active);
        if capacity == 0 {
            debug!(active = self.active, "Emergency pass skipped: at capacity");
            return Vec::new();
        }

        let mut candidates: Vec<usize> = fleet
            .iter()
            .enumerate()
            .filter(|(_, aircraft)| aircraft.is_fault_candidate())
            .map(|(idx, _)| idx)
            .collect();
        if candidates.is_empty() {
            debug!("Emergency pass skipped: no airborne candidates");
            return Vec::new();
        }

        let wanted: u32 = if rng.random_bool(self.config.double_fault_probability) {
            2
        } else {
            1
        };
        let batch = usize::try_from(wanted.min(capacity))
            .unwrap_or(1)
            .min(candidates.len());

        let mut notices = Vec::with_capacity(batch);
        for _ in 0..batch {
            let pick = rng.random_range(0..candidates.len());
            let idx = candidates.swap_remove(pick);
            let Some(aircraft) = fleet.get_mut(idx) else {
                continue;
            };
            let kind = pick_kind(rng);
            aircraft.emergency = Some(kind);
            aircraft.emergency_started_at = Some(now);
            self.active = self.active.saturating_add(1);

            info!(
                callsign = %aircraft.callsign,
                emergency = %kind,
                active = self.active,
                "Emergency injected"
            );
            notices.push(Notice::error(format!(
                "\u{1f6a8} EMERGENCY: {} - {}!",
                aircraft.callsign,
                kind.headline()
            )));
        }
        notices
    }
}

fn pick_kind<R: Rng + ?Sized>(rng: &mut R) -> EmergencyKind {
    let idx = rng.random_range(0..EmergencyKind::ALL.len());
    EmergencyKind::ALL
        .get(idx)
        .copied()
        .unwrap_or(EmergencyKind::Fire)
}

#[cfg(test)]
mod tests {
    use atcsim_types::{Point, WeightClass};
    use chrono::TimeDelta;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(secs)
    }

    fn airborne_fleet(n: usize) -> Vec<Aircraft> {
        (0..n)
            .map(|i| {
                Aircraft::airborne(
                    format!("TST{i:03}"),
                    WeightClass::Regular,
                    "A320",
                    Point::new(0.0, 0.0),
                )
            })
            .collect()
    }

    fn always_double() -> EmergencyConfig {
        EmergencyConfig {
            double_fault_probability: 1.0,
            ..EmergencyConfig::default()
        }
    }

    #[test]
    fn nothing_before_initial_delay() {
        let mut generator = EmergencyGenerator::new(always_double());
        let mut fleet = airborne_fleet(4);
        let mut rng = SmallRng::seed_from_u64(1);
        for secs in 0..20 {
            assert!(generator.poll(&mut fleet, t(0), t(secs), &mut rng).is_empty());
        }
        assert_eq!(generator.active(), 0);
        assert!(generator.last_check().is_none());
        assert!(fleet.iter().all(|a| a.emergency.is_none()));
    }

    #[test]
    fn first_pass_right_after_delay() {
        let mut generator = EmergencyGenerator::new(always_double());
        let mut fleet = airborne_fleet(4);
        let mut rng = SmallRng::seed_from_u64(2);
        let notices = generator.poll(&mut fleet, t(0), t(20), &mut rng);
        assert_eq!(notices.len(), 2);
        assert_eq!(generator.active(), 2);
        assert_eq!(fleet.iter().filter(|a| a.emergency.is_some()).count(), 2);
        assert!(
            notices
                .iter()
                .all(|n| n.message.starts_with("\u{1f6a8} EMERGENCY: TST"))
        );
    }

    #[test]
    fn passes_are_spaced_by_interval() {
        let mut generator = EmergencyGenerator::new(EmergencyConfig {
            double_fault_probability: 0.0,
            ..EmergencyConfig::default()
        });
        let mut fleet = airborne_fleet(4);
        let mut rng = SmallRng::seed_from_u64(3);

        assert_eq!(generator.poll(&mut fleet, t(0), t(30), &mut rng).len(), 1);
        assert!(generator.poll(&mut fleet, t(0), t(31), &mut rng).is_empty());
        assert!(generator.poll(&mut fleet, t(0), t(209), &mut rng).is_empty());
        assert_eq!(generator.poll(&mut fleet, t(0), t(210), &mut rng).len(), 1);
        assert_eq!(generator.active(), 2);
    }

    #[test]
    fn capacity_never_exceeded() {
        let mut generator = EmergencyGenerator::new(always_double());
        let mut fleet = airborne_fleet(8);
        let mut rng = SmallRng::seed_from_u64(4);
        for step in 0..20 {
            let _ = generator.poll(&mut fleet, t(0), t(20 + step * 180), &mut rng);
            assert!(generator.active() <= 2);
            assert!(fleet.iter().filter(|a| a.emergency.is_some()).count() <= 2);
        }
    }

    #[test]
    fn resolve_frees_capacity() {
        let mut generator = EmergencyGenerator::new(always_double());
        let mut fleet = airborne_fleet(3);
        let mut rng = SmallRng::seed_from_u64(5);
        let _ = generator.poll(&mut fleet, t(0), t(20), &mut rng);
        assert_eq!(generator.active(), 2);

        generator.resolve();
        assert_eq!(generator.active(), 1);
        let notices = generator.poll(&mut fleet, t(0), t(200), &mut rng);
        assert_eq!(notices.len(), 1);
        assert_eq!(generator.active(), 2);

        generator.resolve();
        generator.resolve();
        generator.resolve();
        assert_eq!(generator.active(), 0);
    }

    #[test]
    fn grounded_aircraft_never_faulted() {
        let mut generator = EmergencyGenerator::new(always_double());
        let mut fleet = airborne_fleet(2);
        for aircraft in &mut fleet {
            aircraft.is_in_air = false;
        }
        let mut rng = SmallRng::seed_from_u64(6);
        assert!(generator.poll(&mut fleet, t(0), t(20), &mut rng).is_empty());
        // The pass is consumed even though nothing was injected.
        assert_eq!(generator.last_check(), Some(t(20)));
    }

    #[test]
    fn batch_capped_by_candidates() {
        let mut generator = EmergencyGenerator::new(always_double());
        let mut fleet = airborne_fleet(1);
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(generator.poll(&mut fleet, t(0), t(20), &mut rng).len(), 1);
        assert_eq!(generator.active(), 1);
    }
}
