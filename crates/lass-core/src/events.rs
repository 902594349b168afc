use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::NewStudyRecord;

/// Every engine state change produces an Event.
/// Observers (record emitter, CLI printers, background runners) consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CountdownStarted {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Duration picked while not running (preset or custom).
    CountdownDurationSelected {
        minutes: u32,
        remaining_ms: u64,
    },
    /// Preset pressed while running: time added on top of what is left.
    CountdownExtended {
        added_ms: u64,
        remaining_ms: u64,
    },
    /// Countdown ran out. Carries the record to persist.
    CountdownCompleted {
        record: NewStudyRecord,
    },
    CountdownReset {
        remaining_ms: u64,
    },
    StopwatchStarted {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    LapRecorded {
        /// Zero-based lap number.
        index: usize,
        split_ms: u64,
        elapsed_ms: u64,
        shortest: bool,
    },
    /// Stopwatch stopped by the user. Carries the record to persist.
    StopwatchStopped {
        elapsed_ms: u64,
        record: NewStudyRecord,
    },
    StopwatchReset,
}

impl Event {
    /// The study record this event asks to persist, if any.
    pub fn record(&self) -> Option<&NewStudyRecord> {
        match self {
            Event::CountdownCompleted { record } | Event::StopwatchStopped { record, .. } => {
                Some(record)
            }
            _ => None,
        }
    }
}
