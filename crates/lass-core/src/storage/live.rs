//! Live, order-preserving views over the database.
//!
//! Every write through [`LiveStore`] re-reads the affected table and
//! publishes the fresh list on a `watch` channel, so observers always see the
//! same ordering the plain `list_*` queries return.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use super::database::Database;
use super::notebook::{NewQuestion, NewReminder, Question, Reminder};
use crate::error::Result;
use crate::record::{NewStudyRecord, StudyRecord};
use crate::recorder::RecordSink;

pub struct LiveStore {
    db: Mutex<Database>,
    records: watch::Sender<Vec<StudyRecord>>,
    reminders: watch::Sender<Vec<Reminder>>,
    questions: watch::Sender<Vec<Question>>,
}

impl LiveStore {
    pub fn new(db: Database) -> Result<Self> {
        let (records, _) = watch::channel(db.list_study_records()?);
        let (reminders, _) = watch::channel(db.list_reminders(true)?);
        let (questions, _) = watch::channel(db.list_questions()?);
        Ok(Self {
            db: Mutex::new(db),
            records,
            reminders,
            questions,
        })
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Direct access for reads and for tables without a live view (kv).
    pub fn with_database<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        f(&self.db())
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Study records, most recent start first.
    pub fn observe_study_records(&self) -> watch::Receiver<Vec<StudyRecord>> {
        self.records.subscribe()
    }

    /// All reminders (completed included), newest first.
    pub fn observe_reminders(&self) -> watch::Receiver<Vec<Reminder>> {
        self.reminders.subscribe()
    }

    /// Questions, highest id first.
    pub fn observe_questions(&self) -> watch::Receiver<Vec<Question>> {
        self.questions.subscribe()
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord> {
        let db = self.db();
        let saved = db.insert_study_record(record)?;
        publish(&self.records, db.list_study_records());
        Ok(saved)
    }

    pub fn delete_study_record(&self, id: i64) -> Result<()> {
        let db = self.db();
        db.delete_study_record(id)?;
        publish(&self.records, db.list_study_records());
        Ok(())
    }

    pub fn insert_reminder(&self, new: &NewReminder, now: DateTime<Utc>) -> Result<Reminder> {
        let db = self.db();
        let saved = db.insert_reminder(new, now)?;
        publish(&self.reminders, db.list_reminders(true));
        Ok(saved)
    }

    pub fn toggle_reminder(&self, id: i64) -> Result<bool> {
        let db = self.db();
        let completed = db.toggle_reminder(id)?;
        publish(&self.reminders, db.list_reminders(true));
        Ok(completed)
    }

    pub fn delete_reminder(&self, id: i64) -> Result<()> {
        let db = self.db();
        db.delete_reminder(id)?;
        publish(&self.reminders, db.list_reminders(true));
        Ok(())
    }

    pub fn insert_question(&self, new: &NewQuestion, now: DateTime<Utc>) -> Result<Question> {
        let db = self.db();
        let saved = db.insert_question(new, now)?;
        publish(&self.questions, db.list_questions());
        Ok(saved)
    }

    pub fn delete_question(&self, id: i64) -> Result<()> {
        let db = self.db();
        db.delete_question(id)?;
        publish(&self.questions, db.list_questions());
        Ok(())
    }
}

impl RecordSink for LiveStore {
    fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord> {
        LiveStore::insert_study_record(self, record)
    }
}

/// The write already succeeded; a failed re-read only leaves observers stale.
fn publish<T>(tx: &watch::Sender<Vec<T>>, fresh: Result<Vec<T>>) {
    match fresh {
        Ok(list) => {
            tx.send_replace(list);
        }
        Err(e) => warn!(error = %e, "failed to refresh live view"),
    }
}
