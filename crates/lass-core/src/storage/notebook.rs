//! Reminders/goals and the mistake-log ("wrong questions") notebook.
//!
//! Thin CRUD over the same SQLite connection as the study records.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::database::{ms_to_datetime, Database};
use crate::error::{DatabaseError, Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub is_goal: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub title: String,
    pub description: String,
    pub is_goal: bool,
}

impl NewReminder {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub subject: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    /// May be empty.
    pub subject: String,
    pub question: String,
    pub answer: String,
}

impl NewQuestion {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.question.trim().is_empty() {
            return Err(ValidationError::EmptyField("question"));
        }
        if self.answer.trim().is_empty() {
            return Err(ValidationError::EmptyField("answer"));
        }
        Ok(())
    }
}

impl Database {
    // ── Reminders ────────────────────────────────────────────────────

    /// New reminders always start out not completed.
    pub fn insert_reminder(&self, new: &NewReminder, now: DateTime<Utc>) -> Result<Reminder> {
        new.validate()?;
        self.conn().execute(
            "INSERT INTO reminders (title, description, is_completed, is_goal, created_ms)
             VALUES (?1, ?2, 0, ?3, ?4)",
            params![new.title, new.description, new.is_goal, now.timestamp_millis()],
        )?;
        Ok(Reminder {
            id: self.conn().last_insert_rowid(),
            title: new.title.clone(),
            description: new.description.clone(),
            is_completed: false,
            is_goal: new.is_goal,
            created_at: ms_to_datetime(now.timestamp_millis()),
        })
    }

    /// The only mutation a reminder supports.
    pub fn set_reminder_completed(&self, id: i64, completed: bool) -> Result<()> {
        let n = self.conn().execute(
            "UPDATE reminders SET is_completed = ?1 WHERE id = ?2",
            params![completed, id],
        )?;
        if n == 0 {
            return Err(DatabaseError::NotFound { table: "reminders", id }.into());
        }
        Ok(())
    }

    /// Flip completion and return the new value.
    pub fn toggle_reminder(&self, id: i64) -> Result<bool> {
        let current: bool = self
            .conn()
            .query_row(
                "SELECT is_completed FROM reminders WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DatabaseError::NotFound { table: "reminders", id }
                }
                other => other.into(),
            })?;
        self.set_reminder_completed(id, !current)?;
        Ok(!current)
    }

    pub fn delete_reminder(&self, id: i64) -> Result<()> {
        let n = self
            .conn()
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(DatabaseError::NotFound { table: "reminders", id }.into());
        }
        Ok(())
    }

    /// Newest first. Completed reminders are skipped unless `include_completed`.
    pub fn list_reminders(&self, include_completed: bool) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, title, description, is_completed, is_goal, created_ms
             FROM reminders
             WHERE ?1 OR is_completed = 0
             ORDER BY created_ms DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![include_completed], row_to_reminder)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Questions ────────────────────────────────────────────────────

    pub fn insert_question(&self, new: &NewQuestion, now: DateTime<Utc>) -> Result<Question> {
        new.validate()?;
        self.conn().execute(
            "INSERT INTO questions (subject, question, answer, created_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![new.subject, new.question, new.answer, now.timestamp_millis()],
        )?;
        Ok(Question {
            id: self.conn().last_insert_rowid(),
            subject: new.subject.clone(),
            question: new.question.clone(),
            answer: new.answer.clone(),
            created_at: ms_to_datetime(now.timestamp_millis()),
        })
    }

    pub fn delete_question(&self, id: i64) -> Result<()> {
        let n = self
            .conn()
            .execute("DELETE FROM questions WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(DatabaseError::NotFound { table: "questions", id }.into());
        }
        Ok(())
    }

    /// Highest id first.
    pub fn list_questions(&self) -> Result<Vec<Question>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, subject, question, answer, created_ms
             FROM questions
             ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Question {
                id: row.get(0)?,
                subject: row.get(1)?,
                question: row.get(2)?,
                answer: row.get(3)?,
                created_at: ms_to_datetime(row.get(4)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn row_to_reminder(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_completed: row.get(3)?,
        is_goal: row.get(4)?,
        created_at: ms_to_datetime(row.get(5)?),
    })
}
