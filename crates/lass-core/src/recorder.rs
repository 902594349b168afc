//! Record emission and the observer seam between engines and their callers.
//!
//! Engines only return events. Whoever drives an engine (a foreground
//! command, a background [`SessionRunner`](crate::runner::SessionRunner))
//! forwards those events to [`SessionObserver`]s. [`RecordEmitter`] is the
//! observer that turns record-carrying events into storage inserts.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::events::Event;
use crate::record::{NewStudyRecord, StudyRecord};

/// Receives every event an engine produces.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<T: SessionObserver + ?Sized> SessionObserver for Arc<T> {
    fn on_event(&self, event: &Event) {
        (**self).on_event(event)
    }
}

/// Storage side of record emission.
pub trait RecordSink {
    fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord>;
}

impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord> {
        (**self).insert_study_record(record)
    }
}

impl<T: RecordSink + ?Sized> RecordSink for &T {
    fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord> {
        (**self).insert_study_record(record)
    }
}

/// Hands finished sessions to storage.
///
/// Fire-and-forget: a failed insert is logged and dropped. The engine that
/// produced the record has already moved on and is never rolled back.
pub struct RecordEmitter<S> {
    sink: S,
}

impl<S: RecordSink> RecordEmitter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn emit(&self, record: &NewStudyRecord) -> Option<StudyRecord> {
        match self.sink.insert_study_record(record) {
            Ok(saved) => {
                info!(
                    id = saved.id,
                    kind = saved.kind.as_str(),
                    duration_ms = saved.duration_ms,
                    "study record saved"
                );
                Some(saved)
            }
            Err(e) => {
                warn!(error = %e, kind = record.kind().as_str(), "failed to save study record");
                None
            }
        }
    }

    /// Persist the record carried by `event`, if there is one.
    pub fn handle(&self, event: &Event) -> Option<StudyRecord> {
        event.record().and_then(|record| self.emit(record))
    }
}

impl<S: RecordSink + Send + Sync> SessionObserver for RecordEmitter<S> {
    fn on_event(&self, event: &Event) {
        self.handle(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, DatabaseError};
    use crate::record::SessionKind;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<NewStudyRecord>>,
        fail: bool,
    }

    impl RecordSink for MemorySink {
        fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord> {
            if self.fail {
                return Err(CoreError::Database(DatabaseError::Locked));
            }
            let mut saved = self.saved.lock().unwrap();
            saved.push(record.clone());
            Ok(record.clone().with_id(saved.len() as i64))
        }
    }

    fn record() -> NewStudyRecord {
        let start = Utc::now();
        NewStudyRecord::between(SessionKind::Stopwatch, start, start + Duration::seconds(42))
    }

    #[test]
    fn forwards_record_events_only() {
        let emitter = RecordEmitter::new(MemorySink::default());
        emitter.on_event(&Event::StopwatchReset);
        emitter.on_event(&Event::StopwatchStopped {
            elapsed_ms: 42_000,
            record: record(),
        });
        let saved = emitter.sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].duration_ms(), 42_000);
    }

    #[test]
    fn failed_insert_is_swallowed() {
        let emitter = RecordEmitter::new(MemorySink {
            fail: true,
            ..Default::default()
        });
        assert!(emitter.emit(&record()).is_none());
    }
}
