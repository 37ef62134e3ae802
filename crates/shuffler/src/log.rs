//! The operator log: what the person running the host gets to read.
//!
//! Entries are kept newest first and the oldest ones fall off once the log
//! reaches its capacity. Every entry is also emitted as a `tracing` event so
//! it lands in the process log as well.

use std::collections::VecDeque;
use std::fmt;

use tracing::Level;

/// Default number of entries kept.
pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// One line of the operator log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity, mirrored into the `tracing` event.
    pub level: Level,
    /// Human-readable text.
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Bounded, newest-first log of host events.
#[derive(Debug)]
pub struct OperatorLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl OperatorLog {
    /// Creates an empty log holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Records an informational event.
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Level::INFO, text.into());
    }

    /// Records an anomaly.
    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(Level::WARN, text.into());
    }

    /// Records an event at the given level.
    pub fn push(&mut self, level: Level, text: String) {
        match level {
            Level::ERROR => tracing::error!(target: "shuffler::operator", "{text}"),
            Level::WARN => tracing::warn!(target: "shuffler::operator", "{text}"),
            Level::INFO => tracing::info!(target: "shuffler::operator", "{text}"),
            Level::DEBUG => tracing::debug!(target: "shuffler::operator", "{text}"),
            _ => tracing::trace!(target: "shuffler::operator", "{text}"),
        }
        self.entries.push_front(LogEntry { level, text });
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for OperatorLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
