//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Study records emitted by the countdown and stopwatch
//! - Reminders and questions (see [`notebook`](super::notebook))
//! - Daily and all-time study statistics
//! - Key-value store for application state

use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::record::{NewStudyRecord, SessionKind, StudyRecord};
use crate::recorder::RecordSink;

/// Totals for one session kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTotals {
    pub sessions: u64,
    pub total_ms: u64,
}

/// Study report for one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub sessions: u64,
    pub total_ms: u64,
    /// Zero when there were no sessions.
    pub average_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_ms: u64,
    pub countdown: KindTotals,
    pub stopwatch: KindTotals,
    pub today: DayStats,
}

/// SQLite database for all persisted rows.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/lass.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("lass.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "database opened");
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Study records ────────────────────────────────────────────────

    pub fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord> {
        self.conn.execute(
            "INSERT INTO study_records (start_ms, end_ms, duration_ms, kind)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.started_at().timestamp_millis(),
                record.ended_at().timestamp_millis(),
                record.duration_ms() as i64,
                record.kind().as_str(),
            ],
        )?;
        Ok(record.clone().with_id(self.conn.last_insert_rowid()))
    }

    pub fn delete_study_record(&self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM study_records WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(DatabaseError::NotFound {
                table: "study_records",
                id,
            }
            .into());
        }
        Ok(())
    }

    /// All records, most recent start first.
    pub fn list_study_records(&self) -> Result<Vec<StudyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_ms, end_ms, duration_ms, kind
             FROM study_records
             ORDER BY start_ms DESC, id DESC",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Statistics ───────────────────────────────────────────────────

    /// Records whose start falls on `day` in local time.
    pub fn day_stats(&self, day: NaiveDate) -> Result<DayStats> {
        let (from, to) = local_day_bounds_ms(day);
        let (sessions, total_ms) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_ms), 0)
             FROM study_records
             WHERE start_ms >= ?1 AND start_ms < ?2",
            params![from, to],
            |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
        )?;
        Ok(DayStats {
            date: day,
            sessions,
            total_ms,
            average_ms: if sessions == 0 { 0 } else { total_ms / sessions },
        })
    }

    pub fn stats(&self, today: NaiveDate) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*), COALESCE(SUM(duration_ms), 0)
             FROM study_records
             GROUP BY kind",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)? as u64,
                row.get::<_, i64>(2)? as u64,
            ))
        })?;

        let mut countdown = KindTotals::default();
        let mut stopwatch = KindTotals::default();
        for row in rows {
            let (kind, sessions, total_ms) = row?;
            let totals = match SessionKind::parse(&kind) {
                Some(SessionKind::Countdown) => &mut countdown,
                Some(SessionKind::Stopwatch) => &mut stopwatch,
                None => continue,
            };
            totals.sessions += sessions;
            totals.total_ms += total_ms;
        }

        Ok(Stats {
            total_sessions: countdown.sessions + stopwatch.sessions,
            total_ms: countdown.total_ms + stopwatch.total_ms,
            countdown,
            stopwatch,
            today: self.day_stats(today)?,
        })
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl RecordSink for Database {
    fn insert_study_record(&self, record: &NewStudyRecord) -> Result<StudyRecord> {
        Database::insert_study_record(self, record)
    }
}

pub(crate) fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StudyRecord> {
    let kind: String = row.get(4)?;
    let kind = SessionKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown session kind '{kind}'").into(),
        )
    })?;
    Ok(StudyRecord {
        id: row.get(0)?,
        started_at: ms_to_datetime(row.get(1)?),
        ended_at: ms_to_datetime(row.get(2)?),
        duration_ms: row.get::<_, i64>(3)? as u64,
        kind,
    })
}

/// `[local midnight of day, local midnight of the next day)` in epoch ms.
fn local_day_bounds_ms(day: NaiveDate) -> (i64, i64) {
    let next = day.succ_opt().unwrap_or(day);
    (local_midnight_ms(day), local_midnight_ms(next))
}

fn local_midnight_ms(day: NaiveDate) -> i64 {
    let naive = day.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}
