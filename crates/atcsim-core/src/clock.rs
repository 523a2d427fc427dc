//! Simulation clock and wall-clock time sources.
//!
//! The clock counts ticks (frames) and remembers when the run started.
//! All timing that matters to the simulation -- runway reservations, the
//! taxi-in dwell, the emergency schedule -- is measured in wall-clock
//! instants read from a [`TimeSource`], never derived from the tick count.
//!
//! # Design Principles
//!
//! - The tick counter uses checked arithmetic (no silent overflow).
//! - Time is injected. Production uses [`SystemTimeSource`]; tests and
//!   replays use [`ManualTimeSource`], which only moves when told to.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Source of "now" for every time comparison in the engine.
pub trait TimeSource: Send {
    /// Current wall-clock instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when advanced.
///
/// Clones share the same offset, so a test can keep one handle and hand
/// another to the engine.
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    origin: DateTime<Utc>,
    offset_ms: Arc<AtomicI64>,
}

impl ManualTimeSource {
    /// Start a manual clock at `origin`.
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            offset_ms: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Start a manual clock at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        self.offset_ms
            .fetch_add(by.num_milliseconds(), Ordering::AcqRel);
    }

    /// Move the clock forward by whole milliseconds.
    pub fn advance_ms(&self, ms: i64) {
        self.offset_ms.fetch_add(ms, Ordering::AcqRel);
    }

    /// Milliseconds elapsed since `origin`.
    pub fn elapsed_ms(&self) -> i64 {
        self.offset_ms.load(Ordering::Acquire)
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.origin
            .checked_add_signed(TimeDelta::milliseconds(self.elapsed_ms()))
            .unwrap_or(self.origin)
    }
}

/// Tick counter plus the run's start instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    /// Ticks completed so far.
    tick: u64,

    /// Wall-clock instant the run started.
    started_at: DateTime<Utc>,
}

impl SimulationClock {
    /// Create a clock at tick 0.
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            tick: 0,
            started_at,
        }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the start instant.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time elapsed between the start and `now`, floored at zero.
    pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.started_at)
            .max(TimeDelta::zero())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn advance_increments_tick() {
        let mut clock = SimulationClock::new(Utc::now());
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn advance_overflow_is_an_error() {
        let mut clock = SimulationClock {
            tick: u64::MAX,
            started_at: Utc::now(),
        };
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
    }

    #[test]
    fn elapsed_never_negative() {
        let start = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(10);
        let clock = SimulationClock::new(start);
        assert_eq!(clock.elapsed(DateTime::<Utc>::UNIX_EPOCH), TimeDelta::zero());
        assert_eq!(
            clock.elapsed(start + TimeDelta::seconds(3)),
            TimeDelta::seconds(3)
        );
    }

    #[test]
    fn manual_time_source_shares_offset_across_clones() {
        let time = ManualTimeSource::at_epoch();
        let handle = time.clone();
        assert_eq!(time.now(), DateTime::<Utc>::UNIX_EPOCH);

        handle.advance(TimeDelta::seconds(30));
        assert_eq!(time.elapsed_ms(), 30_000);
        handle.advance_ms(500);
        assert_eq!(
            time.now(),
            DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(30_500)
        );
    }

    #[test]
    fn manual_time_out_of_range_falls_back_to_origin() {
        let time = ManualTimeSource::at_epoch();
        time.advance_ms(i64::MAX);
        assert_eq!(time.now(), DateTime::<Utc>::UNIX_EPOCH);
    }
}
