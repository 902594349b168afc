//! Stopwatch engine with lap tracking.
//!
//! Like the countdown, elapsed time is derived from `now - started_at` on
//! every tick rather than accumulated per tick, so scheduling jitter and
//! suspended tick loops never cause drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::millis_between;
use crate::events::Event;
use crate::record::{NewStudyRecord, SessionKind};

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchSnapshot {
    pub running: bool,
    pub elapsed_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    /// Cumulative elapsed value at each lap.
    pub laps: Vec<u64>,
    pub splits: Vec<u64>,
    pub shortest_split_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchEngine {
    running: bool,
    elapsed_ms: u64,
    /// Elapsed time banked by earlier run segments.
    #[serde(default)]
    banked_ms: u64,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    laps: Vec<u64>,
    #[serde(default)]
    shortest_split_ms: Option<u64>,
}

impl StopwatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn laps(&self) -> &[u64] {
        &self.laps
    }

    /// Time between consecutive laps; the first split is measured from zero.
    pub fn splits(&self) -> Vec<u64> {
        let mut prev = 0;
        self.laps
            .iter()
            .map(|&lap| {
                let split = lap.saturating_sub(prev);
                prev = lap;
                split
            })
            .collect()
    }

    pub fn shortest_split(&self) -> Option<u64> {
        self.shortest_split_ms
    }

    pub fn snapshot(&self) -> StopwatchSnapshot {
        StopwatchSnapshot {
            running: self.running,
            elapsed_ms: self.elapsed_ms,
            started_at: self.started_at,
            laps: self.laps.clone(),
            splits: self.splits(),
            shortest_split_ms: self.shortest_split_ms,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.running {
            return None;
        }
        self.running = true;
        self.banked_ms = self.elapsed_ms;
        self.started_at = Some(now);
        info!(elapsed_ms = self.elapsed_ms, "stopwatch started");
        Some(Event::StopwatchStarted {
            elapsed_ms: self.elapsed_ms,
            at: now,
        })
    }

    /// Recompute elapsed time. Never emits an event.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if let (true, Some(started_at)) = (self.running, self.started_at) {
            self.elapsed_ms = self.banked_ms + millis_between(started_at, now);
        }
        None
    }

    pub fn lap(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.tick(now);
        let split_ms = self
            .elapsed_ms
            .saturating_sub(self.laps.last().copied().unwrap_or(0));
        self.laps.push(self.elapsed_ms);

        let shortest = self.shortest_split_ms.map_or(true, |s| split_ms < s);
        if shortest {
            self.shortest_split_ms = Some(split_ms);
        }
        debug!(lap = self.laps.len(), split_ms, "lap recorded");
        Some(Event::LapRecorded {
            index: self.laps.len() - 1,
            split_ms,
            elapsed_ms: self.elapsed_ms,
            shortest,
        })
    }

    /// Stop and hand back the finished run as a study record.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.tick(now);
        let started_at = self.started_at.take()?;
        self.running = false;
        self.banked_ms = self.elapsed_ms;

        let record = NewStudyRecord::between(SessionKind::Stopwatch, started_at, now);
        info!(
            elapsed_ms = self.elapsed_ms,
            duration_ms = record.duration_ms(),
            "stopwatch stopped"
        );
        Some(Event::StopwatchStopped {
            elapsed_ms: self.elapsed_ms,
            record,
        })
    }

    /// Back to zero. A run in progress is discarded without a record.
    pub fn reset(&mut self) -> Option<Event> {
        *self = Self::default();
        Some(Event::StopwatchReset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    #[test]
    fn elapsed_survives_suspended_ticking() {
        let mut sw = StopwatchEngine::new();
        sw.start(t0());
        sw.tick(at(2_000));
        // no ticks for five seconds
        sw.tick(at(7_000));
        assert_eq!(sw.elapsed_ms(), 7_000);
    }

    #[test]
    fn laps_and_splits() {
        let mut sw = StopwatchEngine::new();
        sw.start(t0());
        sw.lap(at(1_500));
        sw.lap(at(2_300));
        sw.lap(at(4_000));
        assert_eq!(sw.laps(), &[1_500, 2_300, 4_000]);
        assert_eq!(sw.splits(), vec![1_500, 800, 1_700]);
        assert_eq!(sw.shortest_split(), Some(800));
    }

    #[test]
    fn lap_event_flags_new_shortest() {
        let mut sw = StopwatchEngine::new();
        sw.start(t0());
        let first = sw.lap(at(1_000));
        let slower = sw.lap(at(3_000));
        let faster = sw.lap(at(3_500));
        assert!(matches!(first, Some(Event::LapRecorded { shortest: true, .. })));
        assert!(matches!(slower, Some(Event::LapRecorded { shortest: false, .. })));
        assert!(matches!(
            faster,
            Some(Event::LapRecorded { index: 2, split_ms: 500, shortest: true, .. })
        ));
    }

    #[test]
    fn lap_while_stopped_is_noop() {
        let mut sw = StopwatchEngine::new();
        assert!(sw.lap(t0()).is_none());
        assert!(sw.laps().is_empty());
    }

    #[test]
    fn stop_emits_record() {
        let mut sw = StopwatchEngine::new();
        sw.start(t0());
        match sw.stop(at(90_000)) {
            Some(Event::StopwatchStopped { elapsed_ms, record }) => {
                assert_eq!(elapsed_ms, 90_000);
                assert_eq!(record.kind(), SessionKind::Stopwatch);
                assert_eq!(record.started_at(), t0());
                assert_eq!(record.duration_ms(), 90_000);
            }
            other => panic!("expected stop, got {other:?}"),
        }
        assert!(!sw.is_running());
        assert_eq!(sw.started_at(), None);
        assert!(sw.stop(at(95_000)).is_none());
    }

    #[test]
    fn restart_continues_elapsed() {
        let mut sw = StopwatchEngine::new();
        sw.start(t0());
        sw.stop(at(10_000));
        sw.start(at(60_000));
        sw.tick(at(65_000));
        assert_eq!(sw.elapsed_ms(), 15_000);

        let record = sw.stop(at(70_000)).and_then(|e| e.record().cloned()).unwrap();
        assert_eq!(record.duration_ms(), 10_000);
        assert_eq!(sw.elapsed_ms(), 20_000);
    }

    #[test]
    fn reset_clears_everything_without_record() {
        let mut sw = StopwatchEngine::new();
        sw.start(t0());
        sw.lap(at(1_000));
        let event = sw.reset();
        assert_eq!(event, Some(Event::StopwatchReset));
        assert_eq!(sw, StopwatchEngine::new());
        assert_eq!(sw.shortest_split(), None);

        sw.reset();
        assert_eq!(sw, StopwatchEngine::new());
    }

    proptest! {
        #[test]
        fn splits_match_lap_differences(gaps in proptest::collection::vec(0i64..100_000, 1..40)) {
            let mut sw = StopwatchEngine::new();
            sw.start(t0());
            let mut offset = 0;
            for gap in &gaps {
                offset += gap;
                sw.lap(at(offset));
            }

            let laps = sw.laps().to_vec();
            let splits = sw.splits();
            prop_assert_eq!(splits.len(), laps.len());
            for i in 0..laps.len() {
                let prev = if i == 0 { 0 } else { laps[i - 1] };
                prop_assert!(laps[i] >= prev);
                prop_assert_eq!(splits[i], laps[i] - prev);
            }
            prop_assert_eq!(sw.shortest_split(), splits.iter().copied().min());
        }
    }
}
