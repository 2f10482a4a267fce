//! # Database
//!
//! SQLite persistence for reminders and call logs.
//!
//! Wraps a thread-safe connection behind an async mutex so callers get the
//! same async surface as the rest of the crate. Timestamps are stored as
//! fixed-precision RFC 3339 UTC strings, which keeps SQL string comparison
//! identical to chronological comparison.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Transactional outcome commit (status update + call log)
//! - 1.1.0: Due-reminder query with covering index
//! - 1.0.0: Initial schema and reminder CRUD

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlite::{Connection, ConnectionThreadSafe, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::model::{CallLog, CallStatus, NewReminder, Reminder, ReminderStatus};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    message       TEXT NOT NULL,
    phone_number  TEXT NOT NULL,
    scheduled_for TEXT NOT NULL,
    timezone      TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'scheduled',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS call_logs (
    id            TEXT PRIMARY KEY,
    reminder_id   TEXT NOT NULL REFERENCES reminders(id) ON DELETE CASCADE,
    attempted_at  TEXT NOT NULL,
    status        TEXT NOT NULL,
    response_data TEXT,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(status, scheduled_for);
CREATE INDEX IF NOT EXISTS idx_call_logs_reminder ON call_logs(reminder_id);
";

/// Shared handle to the SQLite store. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<ConnectionThreadSafe>>,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Pass `:memory:` for an in-memory database in tests.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open_thread_safe(path)
            .with_context(|| format!("failed to open database at '{path}'"))?;
        conn.execute("PRAGMA foreign_keys = ON")?;
        conn.execute(SCHEMA).context("failed to run migrations")?;

        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Validate and persist a new reminder.
    pub async fn create_reminder(&self, new: NewReminder) -> Result<Reminder> {
        new.validate()?;
        let reminder = Reminder::new(new);
        self.insert_reminder(&reminder).await?;
        Ok(reminder)
    }

    /// Persist an already-built reminder row as-is.
    pub async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "INSERT INTO reminders
             (id, title, message, phone_number, scheduled_for, timezone, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        stmt.bind((1, reminder.id.as_str()))?;
        stmt.bind((2, reminder.title.as_str()))?;
        stmt.bind((3, reminder.message.as_str()))?;
        stmt.bind((4, reminder.phone_number.as_str()))?;
        stmt.bind((5, to_db_time(&reminder.scheduled_for).as_str()))?;
        stmt.bind((6, reminder.timezone.as_str()))?;
        stmt.bind((7, reminder.status.as_str()))?;
        stmt.bind((8, to_db_time(&reminder.created_at).as_str()))?;
        stmt.bind((9, to_db_time(&reminder.updated_at).as_str()))?;
        stmt.next()?;
        Ok(())
    }

    pub async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM reminders WHERE id = ?")?;
        stmt.bind((1, id))?;
        match stmt.next()? {
            State::Row => Ok(Some(read_reminder(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    /// All reminders, newest schedule first.
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT * FROM reminders ORDER BY scheduled_for DESC, id")?;
        let mut reminders = Vec::new();
        while let State::Row = stmt.next()? {
            reminders.push(read_reminder(&stmt)?);
        }
        Ok(reminders)
    }

    /// Delete a reminder (and, via cascade, its call logs).
    /// Returns false when no such reminder existed.
    pub async fn delete_reminder(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("DELETE FROM reminders WHERE id = ?")?;
        stmt.bind((1, id))?;
        stmt.next()?;
        Ok(conn.change_count() > 0)
    }

    /// Reminders that are still scheduled and due at `now` (inclusive),
    /// in stable ascending schedule order.
    pub async fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT * FROM reminders
             WHERE status = 'scheduled' AND scheduled_for <= ?
             ORDER BY scheduled_for, id",
        )?;
        stmt.bind((1, to_db_time(&now).as_str()))?;
        let mut due = Vec::new();
        while let State::Row = stmt.next()? {
            due.push(read_reminder(&stmt)?);
        }
        Ok(due)
    }

    /// Commit a dispatch outcome: the reminder's terminal status and its
    /// call-log entry either both persist or neither does.
    pub async fn record_outcome(
        &self,
        reminder_id: &str,
        status: ReminderStatus,
        log: &CallLog,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("BEGIN IMMEDIATE")?;
        let result = write_outcome(&conn, reminder_id, status, log);
        match result {
            Ok(()) => {
                conn.execute("COMMIT")?;
                Ok(())
            }
            Err(e) => {
                // Best effort; the connection drops the transaction anyway.
                let _ = conn.execute("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Call logs for one reminder, oldest attempt first.
    pub async fn call_logs_for(&self, reminder_id: &str) -> Result<Vec<CallLog>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT * FROM call_logs WHERE reminder_id = ? ORDER BY attempted_at, id",
        )?;
        stmt.bind((1, reminder_id))?;
        let mut logs = Vec::new();
        while let State::Row = stmt.next()? {
            logs.push(read_call_log(&stmt)?);
        }
        Ok(logs)
    }

    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(sql)?;
        Ok(())
    }
}

fn write_outcome(
    conn: &ConnectionThreadSafe,
    reminder_id: &str,
    status: ReminderStatus,
    log: &CallLog,
) -> Result<()> {
    let mut update = conn.prepare("UPDATE reminders SET status = ?, updated_at = ? WHERE id = ?")?;
    update.bind((1, status.as_str()))?;
    update.bind((2, to_db_time(&Utc::now()).as_str()))?;
    update.bind((3, reminder_id))?;
    update.next()?;

    let mut insert = conn.prepare(
        "INSERT INTO call_logs (id, reminder_id, attempted_at, status, response_data, error_message)
         VALUES (?, ?, ?, ?, ?, ?)",
    )?;
    insert.bind((1, log.id.as_str()))?;
    insert.bind((2, log.reminder_id.as_str()))?;
    insert.bind((3, to_db_time(&log.attempted_at).as_str()))?;
    insert.bind((4, log.status.as_str()))?;
    insert.bind((5, log.response_data.as_deref()))?;
    insert.bind((6, log.error_message.as_deref()))?;
    insert.next()?;
    Ok(())
}

fn read_reminder(stmt: &Statement<'_>) -> Result<Reminder> {
    Ok(Reminder {
        id: stmt.read::<String, _>("id")?,
        title: stmt.read::<String, _>("title")?,
        message: stmt.read::<String, _>("message")?,
        phone_number: stmt.read::<String, _>("phone_number")?,
        scheduled_for: from_db_time(&stmt.read::<String, _>("scheduled_for")?)?,
        timezone: stmt.read::<String, _>("timezone")?,
        status: ReminderStatus::parse(&stmt.read::<String, _>("status")?)?,
        created_at: from_db_time(&stmt.read::<String, _>("created_at")?)?,
        updated_at: from_db_time(&stmt.read::<String, _>("updated_at")?)?,
    })
}

fn read_call_log(stmt: &Statement<'_>) -> Result<CallLog> {
    Ok(CallLog {
        id: stmt.read::<String, _>("id")?,
        reminder_id: stmt.read::<String, _>("reminder_id")?,
        attempted_at: from_db_time(&stmt.read::<String, _>("attempted_at")?)?,
        status: CallStatus::parse(&stmt.read::<String, _>("status")?)?,
        response_data: stmt.read::<Option<String>, _>("response_data")?,
        error_message: stmt.read::<Option<String>, _>("error_message")?,
    })
}

/// Fixed-width RFC 3339 so lexicographic order equals time order.
fn to_db_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp in database: '{raw}'"))
}
