//! Runway reservation scheduler.
//!
//! Each runway code maps to the instant its current reservation lapses.
//! A runway is free when it has no entry or the entry is at or before
//! "now". Reservations are never released early; they only lapse.

use std::collections::BTreeMap;

use atcsim_types::{RunwayCode, RunwayStatus};
use chrono::{DateTime, TimeDelta, Utc};

/// Tracks per-runway reservation expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunwayScheduler {
    reservations: BTreeMap<RunwayCode, DateTime<Utc>>,
}

impl RunwayScheduler {
    /// Create a scheduler with every runway free.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `runway` can be cleared at `now`.
    pub fn is_free(&self, runway: &RunwayCode, now: DateTime<Utc>) -> bool {
        self.reserved_until(runway).is_none_or(|until| until <= now)
    }

    /// Expiry instant of the most recent reservation, lapsed or not.
    pub fn reserved_until(&self, runway: &RunwayCode) -> Option<DateTime<Utc>> {
        self.reservations.get(runway).copied()
    }

    /// Whole seconds until `runway` is free, rounded up. Zero when free.
    pub fn remaining_secs(&self, runway: &RunwayCode, now: DateTime<Utc>) -> u64 {
        self.reserved_until(runway)
            .map_or(0, |until| ceil_secs(until.signed_duration_since(now)))
    }

    /// Reserve `runway` for `duration` starting at `now`. Returns the
    /// expiry instant.
    ///
    /// Callers check [`is_free`](Self::is_free) first; this overwrites any
    /// existing entry.
    pub fn reserve(
        &mut self,
        runway: RunwayCode,
        now: DateTime<Utc>,
        duration: TimeDelta,
    ) -> DateTime<Utc> {
        let until = now.checked_add_signed(duration).unwrap_or(now);
        self.reservations.insert(runway, until);
        until
    }

    /// Reservation view for every runway in `runways`.
    pub fn status<'a>(
        &self,
        runways: impl IntoIterator<Item = &'a RunwayCode>,
        now: DateTime<Utc>,
    ) -> Vec<RunwayStatus> {
        runways
            .into_iter()
            .map(|runway| {
                let remaining_secs = self.remaining_secs(runway, now);
                RunwayStatus {
                    runway: runway.clone(),
                    reserved_until: self
                        .reserved_until(runway)
                        .filter(|_| remaining_secs > 0),
                    remaining_secs,
                }
            })
            .collect()
    }
}

/// Seconds in `delta`, rounded up, clamped at zero.
fn ceil_secs(delta: TimeDelta) -> u64 {
    let ms = delta.num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    u64::try_from(ms).map_or(u64::MAX, |ms| ms.div_ceil(1000))
}
