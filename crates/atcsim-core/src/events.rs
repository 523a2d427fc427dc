//! Controller activity log.
//!
//! Every rejected command, clearance, state transition, and fault produces
//! a [`LogEvent`] with a severity tag. The engine mirrors each one to
//! `tracing` and keeps the most recent entries in an [`EventLog`], newest
//! first, the way the activity panel shows them. An optional [`EventSink`]
//! receives every entry as it is recorded.

use std::collections::VecDeque;

use atcsim_types::{LogEvent, Severity};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

/// Consumer of controller log entries (activity panel, test recorder, ...).
pub trait EventSink: Send {
    /// Called once for every recorded entry.
    fn on_event(&mut self, event: &LogEvent);
}

/// A log line produced by a subsystem, not yet stamped with tick and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity tag.
    pub severity: Severity,
    /// Free-text message.
    pub message: String,
}

impl Notice {
    /// Build a notice.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// An `info` notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// A `success` notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    /// A `warning` notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// An `error` notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Bounded newest-first ring of log entries.
pub struct EventLog {
    entries: VecDeque<LogEvent>,
    capacity: usize,
    sink: Option<Box<dyn EventSink>>,
}

impl core::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventLog")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl EventLog {
    /// Create an empty log keeping at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sink: None,
        }
    }

    /// Attach a sink, replacing any previous one.
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = Some(sink);
    }

    /// Record an entry, forward it to the sink, and mirror it to tracing.
    pub fn record(
        &mut self,
        tick: u64,
        at: DateTime<Utc>,
        severity: Severity,
        message: impl Into<String>,
    ) {
        let event = LogEvent {
            tick,
            at,
            severity,
            message: message.into(),
        };

        match severity {
            Severity::Info | Severity::Success => {
                info!(tick, %severity, message = %event.message, "Controller log");
            }
            Severity::Warning => warn!(tick, message = %event.message, "Controller log"),
            Severity::Error => error!(tick, message = %event.message, "Controller log"),
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.on_event(&event);
        }

        self.entries.push_front(event);
        self.entries.truncate(self.capacity);
    }

    /// Record a subsystem notice.
    pub fn record_notice(&mut self, tick: u64, at: DateTime<Utc>, notice: Notice) {
        self.record(tick, at, notice.severity, notice.message);
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.entries.iter()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&LogEvent> {
        self.entries.front()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries held.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
