//! Structured Event Log
//!
//! A small in-process ring buffer of recent collector events, in addition
//! to whatever the embedder's `log` subscriber records. Kept separate from
//! the `log` facade because tests and diagnostics want to assert on
//! specific events without installing a logger.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

const RING_CAPACITY: usize = 256;

/// One notable thing the collector did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GcEvent {
    CycleStarted,
    CycleFinished,
    ThreadAdded,
    ThreadRemoved,
    RootRegistered,
    RootDeregistered,
    FinalizerQueued,
}

/// A logged event plus the wall-clock time it was pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub event: GcEvent,
    pub at: DateTime<Utc>,
}

/// Bounded ring buffer of recent [`GcEvent`]s, also mirrored to the `log`
/// facade at debug level.
pub struct TraceLog {
    ring: Mutex<VecDeque<TraceEntry>>,
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceLog {
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
        }
    }

    pub fn push(&self, event: GcEvent) {
        let entry = TraceEntry {
            event,
            at: Utc::now(),
        };
        // Structured output so an embedder's log pipeline can parse a gc
        // event rather than pattern-match a Debug string.
        match serde_json::to_string(&entry) {
            Ok(json) => log::debug!("{json}"),
            Err(e) => log::warn!("failed to serialize gc event: {e}"),
        }
        let mut ring = self.ring.lock();
        if ring.len() == RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(entry);
    }

    /// Most recent events, oldest first.
    pub fn recent(&self) -> Vec<GcEvent> {
        self.ring.lock().iter().map(|e| e.event.clone()).collect()
    }

    /// Most recent events with their timestamps, oldest first.
    pub fn recent_with_timestamps(&self) -> Vec<TraceEntry> {
        self.ring.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_recent_preserve_order() {
        let log = TraceLog::new();
        log.push(GcEvent::CycleStarted);
        log.push(GcEvent::CycleFinished);
        assert_eq!(log.recent(), vec![GcEvent::CycleStarted, GcEvent::CycleFinished]);
    }

    #[test]
    fn gc_event_serializes_to_snake_case_json() {
        let json = serde_json::to_string(&GcEvent::FinalizerQueued).unwrap();
        assert_eq!(json, "\"finalizer_queued\"");
    }

    #[test]
    fn trace_entry_serializes_with_event_and_timestamp() {
        let entry = TraceEntry {
            event: GcEvent::CycleStarted,
            at: Utc::now(),
        };
        let value: serde_json::Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["event"], "cycle_started");
        assert!(value["at"].is_string());
    }

    #[test]
    fn ring_buffer_drops_oldest_when_full() {
        let log = TraceLog::new();
        for _ in 0..RING_CAPACITY + 10 {
            log.push(GcEvent::RootRegistered);
        }
        assert_eq!(log.len(), RING_CAPACITY);
    }
}
