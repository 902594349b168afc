//! # Lass Core Library
//!
//! Core logic for the Lass study assistant: a countdown timer, a stopwatch
//! with laps, study records, reminders and a mistake-log notebook. The
//! `lass` CLI is a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer engines**: wall-clock-based state machines. Every command takes
//!   `now`; the caller invokes `tick()` periodically.
//! - **Recorder**: the [`SessionObserver`] seam and the [`RecordEmitter`]
//!   that persists finished sessions.
//! - **Runner**: an optional tokio tick loop around one engine.
//! - **Storage**: SQLite persistence, live views and TOML configuration.
//!
//! ## Key Components
//!
//! - [`CountdownEngine`] / [`StopwatchEngine`]: session state machines
//! - [`SessionRunner`]: background ticking with snapshot subscriptions
//! - [`Database`] / [`LiveStore`]: persistence
//! - [`Config`]: application configuration

pub mod clock;
pub mod error;
pub mod events;
pub mod format;
pub mod record;
pub mod recorder;
pub mod runner;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use record::{NewStudyRecord, SessionKind, StudyRecord};
pub use recorder::{RecordEmitter, RecordSink, SessionObserver};
pub use runner::SessionRunner;
pub use storage::{Config, Database, LiveStore};
pub use timer::{CountdownEngine, CountdownState, SessionEngine, StopwatchEngine};
