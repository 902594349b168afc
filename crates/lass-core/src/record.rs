//! Study records: the persisted log of finished sessions.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::millis_between;

/// Which engine produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Countdown,
    Stopwatch,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Countdown => "countdown",
            SessionKind::Stopwatch => "stopwatch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "countdown" => Some(SessionKind::Countdown),
            "stopwatch" => Some(SessionKind::Stopwatch),
            _ => None,
        }
    }
}

/// A study record that has not been persisted yet.
///
/// Only constructible through [`NewStudyRecord::between`], which derives the
/// duration from the two instants so `duration_ms == ended_at - started_at`
/// always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudyRecord {
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    duration_ms: u64,
    kind: SessionKind,
}

impl NewStudyRecord {
    /// Build a record spanning `started_at..ended_at`. An `ended_at` earlier
    /// than `started_at` (clock stepped backwards) is pinned to `started_at`.
    ///
    /// Both instants are truncated to whole milliseconds, the resolution
    /// records are stored at.
    pub fn between(kind: SessionKind, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        let started_at = started_at.trunc_subsecs(3);
        let ended_at = ended_at.trunc_subsecs(3).max(started_at);
        Self {
            started_at,
            ended_at,
            duration_ms: millis_between(started_at, ended_at),
            kind,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub(crate) fn with_id(self, id: i64) -> StudyRecord {
        StudyRecord {
            id,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_ms: self.duration_ms,
            kind: self.kind,
        }
    }
}

/// A persisted study record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub kind: SessionKind,
}
