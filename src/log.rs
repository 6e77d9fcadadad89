//! Append-only record of every event crossing the wire.

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// Which side of the connection originated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Client,
    Server,
}

/// One logged event: local wall-clock timestamp, origin, and the serialized
/// JSON payload as it appeared on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub direction: Direction,
    pub payload: String,
}

/// Insertion-ordered event log, retained for the life of the session and never
/// pruned. Retention is gated by the `debug` flag fixed at construction; with
/// it off, `record` is a no-op and the log stays empty.
#[derive(Debug)]
pub struct EventLog {
    debug: bool,
    entries: Mutex<Vec<LogEntry>>,
}

impl EventLog {
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self {
            debug,
            entries: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.debug
    }

    pub fn record(&self, direction: Direction, event: &Value) {
        if !self.debug {
            return;
        }
        let entry = LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            direction,
            payload: event.to_string(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Cloned view of the log in arrival/submission order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
