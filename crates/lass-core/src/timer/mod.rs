mod countdown;
mod stopwatch;

use chrono::{DateTime, Utc};

use crate::events::Event;

pub use countdown::{
    parse_custom_minutes, validate_custom_minutes, CountdownEngine, CountdownSnapshot,
    CountdownState, DEFAULT_MINUTES, MAX_CUSTOM_MINUTES, MIN_CUSTOM_MINUTES, MS_PER_MINUTE,
};
pub use stopwatch::{StopwatchEngine, StopwatchSnapshot};

/// What a session runner needs from an engine.
pub trait SessionEngine: Send + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    fn is_running(&self) -> bool;
    fn tick(&mut self, now: DateTime<Utc>) -> Option<Event>;
    fn snapshot(&self) -> Self::Snapshot;
}

impl SessionEngine for CountdownEngine {
    type Snapshot = CountdownSnapshot;

    fn is_running(&self) -> bool {
        CountdownEngine::is_running(self)
    }

    fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        CountdownEngine::tick(self, now)
    }

    fn snapshot(&self) -> CountdownSnapshot {
        CountdownEngine::snapshot(self)
    }
}

impl SessionEngine for StopwatchEngine {
    type Snapshot = StopwatchSnapshot;

    fn is_running(&self) -> bool {
        StopwatchEngine::is_running(self)
    }

    fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        StopwatchEngine::tick(self, now)
    }

    fn snapshot(&self) -> StopwatchSnapshot {
        StopwatchEngine::snapshot(self)
    }
}
