//! Countdown engine.
//!
//! A wall-clock-based state machine. It holds no thread and never reads the
//! clock itself: every command takes `now`, and the caller is responsible for
//! calling `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> completed -> Idle (remaining 0)
//!   any -> reset -> Idle
//! ```
//!
//! Completion is not a resting state: the tick that runs the countdown out
//! returns [`Event::CountdownCompleted`] and leaves the engine Idle with
//! nothing remaining, so `start` stays a no-op until a new duration or a
//! reset.
//!
//! `remaining` is always recomputed as `remaining_at_start - (now - started_at)`,
//! so a caller that stops ticking for a while (screen dismissed, process
//! suspended) loses nothing: the next tick lands on the right value.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = CountdownEngine::new(30);
//! engine.start(clock.now());
//! // In a loop:
//! if let Some(Event::CountdownCompleted { record }) = engine.tick(clock.now()) { ... }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::millis_between;
use crate::error::ValidationError;
use crate::events::Event;
use crate::record::{NewStudyRecord, SessionKind};

pub const MS_PER_MINUTE: u64 = 60_000;
/// Smallest accepted custom duration, in minutes.
pub const MIN_CUSTOM_MINUTES: u32 = 1;
/// Largest accepted custom duration, in minutes.
pub const MAX_CUSTOM_MINUTES: u32 = 300_000;
pub const DEFAULT_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Paused,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub state: CountdownState,
    pub selected_minutes: u32,
    pub remaining_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    /// 0.0 .. 1.0 of the selected duration already spent.
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownEngine {
    state: CountdownState,
    selected_minutes: u32,
    remaining_ms: u64,
    /// When the current run segment began. `None` unless Running.
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    /// `remaining_ms` as it was at `started_at`.
    #[serde(default)]
    remaining_at_start_ms: u64,
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MINUTES)
    }
}

impl CountdownEngine {
    pub fn new(minutes: u32) -> Self {
        Self {
            state: CountdownState::Idle,
            selected_minutes: minutes,
            remaining_ms: minutes_to_ms(minutes),
            started_at: None,
            remaining_at_start_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn selected_minutes(&self) -> u32 {
        self.selected_minutes
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn progress(&self) -> f64 {
        let total = minutes_to_ms(self.selected_minutes);
        if total == 0 {
            return 0.0;
        }
        (1.0 - self.remaining_ms as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            state: self.state,
            selected_minutes: self.selected_minutes,
            remaining_ms: self.remaining_ms,
            started_at: self.started_at,
            progress: self.progress(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Preset button. Picks the duration when not running; while running the
    /// minutes are added on top of what is left.
    pub fn select_preset(&mut self, minutes: u32) -> Option<Event> {
        if minutes == 0 {
            return None;
        }
        let added_ms = minutes_to_ms(minutes);
        if self.state == CountdownState::Running {
            self.remaining_ms = self.remaining_ms.saturating_add(added_ms);
            self.remaining_at_start_ms = self.remaining_at_start_ms.saturating_add(added_ms);
            self.selected_minutes = ((self.remaining_ms / MS_PER_MINUTE) as u32).max(1);
            debug!(added_ms, remaining_ms = self.remaining_ms, "countdown extended");
            return Some(Event::CountdownExtended {
                added_ms,
                remaining_ms: self.remaining_ms,
            });
        }

        self.state = CountdownState::Idle;
        self.started_at = None;
        self.selected_minutes = minutes;
        self.remaining_ms = added_ms;
        Some(Event::CountdownDurationSelected {
            minutes,
            remaining_ms: self.remaining_ms,
        })
    }

    /// Custom duration entry. Out-of-range input leaves the engine untouched;
    /// while running the entry is ignored.
    pub fn set_custom(&mut self, minutes: u64) -> Result<Option<Event>, ValidationError> {
        let minutes = validate_custom_minutes(minutes)?;
        if self.state == CountdownState::Running {
            return Ok(None);
        }
        Ok(self.select_preset(minutes))
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.state {
            CountdownState::Running => None,
            CountdownState::Paused => self.resume(now),
            CountdownState::Idle => {
                if self.remaining_ms == 0 || self.selected_minutes == 0 {
                    return None;
                }
                self.begin_segment(now);
                info!(remaining_ms = self.remaining_ms, "countdown started");
                Some(Event::CountdownStarted {
                    remaining_ms: self.remaining_ms,
                    at: now,
                })
            }
        }
    }

    /// Freeze the countdown. The interrupted run is not recorded. If the
    /// deadline already passed, this completes the session instead.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        if let Some(completed) = self.tick(now) {
            return Some(completed);
        }
        self.state = CountdownState::Paused;
        self.started_at = None;
        debug!(remaining_ms = self.remaining_ms, "countdown paused");
        Some(Event::CountdownPaused {
            remaining_ms: self.remaining_ms,
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != CountdownState::Paused || self.remaining_ms == 0 {
            return None;
        }
        self.begin_segment(now);
        debug!(remaining_ms = self.remaining_ms, "countdown resumed");
        Some(Event::CountdownResumed {
            remaining_ms: self.remaining_ms,
            at: now,
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.state = CountdownState::Idle;
        self.started_at = None;
        self.remaining_at_start_ms = 0;
        self.remaining_ms = minutes_to_ms(self.selected_minutes);
        Some(Event::CountdownReset {
            remaining_ms: self.remaining_ms,
        })
    }

    /// Call periodically. Returns `Some(Event::CountdownCompleted)` when the
    /// countdown runs out.
    ///
    /// The record ends at the deadline, not at `now`: a tick that arrives late
    /// (nobody was ticking) does not stretch the session.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        let started_at = self.started_at?;
        let elapsed = millis_between(started_at, now);
        self.remaining_ms = self.remaining_at_start_ms.saturating_sub(elapsed);
        if self.remaining_ms > 0 {
            return None;
        }

        self.state = CountdownState::Idle;
        self.started_at = None;
        let deadline = started_at + Duration::milliseconds(self.remaining_at_start_ms as i64);
        self.remaining_at_start_ms = 0;
        let record = NewStudyRecord::between(SessionKind::Countdown, started_at, deadline.min(now));
        info!(duration_ms = record.duration_ms(), "countdown completed");
        Some(Event::CountdownCompleted { record })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_segment(&mut self, now: DateTime<Utc>) {
        self.state = CountdownState::Running;
        self.started_at = Some(now);
        self.remaining_at_start_ms = self.remaining_ms;
    }
}

fn minutes_to_ms(minutes: u32) -> u64 {
    u64::from(minutes) * MS_PER_MINUTE
}

/// Check a custom duration against the accepted range.
pub fn validate_custom_minutes(minutes: u64) -> Result<u32, ValidationError> {
    if minutes < u64::from(MIN_CUSTOM_MINUTES) || minutes > u64::from(MAX_CUSTOM_MINUTES) {
        return Err(ValidationError::DurationOutOfRange {
            value: minutes,
            min: MIN_CUSTOM_MINUTES,
            max: MAX_CUSTOM_MINUTES,
        });
    }
    Ok(minutes as u32)
}

/// Parse keypad/CLI input into a validated number of minutes.
pub fn parse_custom_minutes(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    let minutes = trimmed
        .parse::<u64>()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;
    validate_custom_minutes(minutes)
}
