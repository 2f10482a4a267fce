//! Reminder and call-log domain types
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// E.164: leading `+`, then 2-15 digits, no leading zero.
const PHONE_PATTERN: &str = r"^\+[1-9]\d{1,14}$";

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).unwrap())
}

/// Lifecycle state of a reminder.
///
/// `Scheduled` is the only non-terminal state; a reminder transitions to
/// exactly one of `Completed`/`Failed` on its single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Scheduled,
    Completed,
    Failed,
}

impl ReminderStatus {
    /// String form used for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Scheduled => "scheduled",
            ReminderStatus::Completed => "completed",
            ReminderStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "scheduled" => Ok(ReminderStatus::Scheduled),
            "completed" => Ok(ReminderStatus::Completed),
            "failed" => Ok(ReminderStatus::Failed),
            other => bail!("unknown reminder status '{other}'"),
        }
    }

    /// True once no further automatic transition can occur.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReminderStatus::Scheduled)
    }
}

/// Outcome of a single call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Failed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "success" => Ok(CallStatus::Success),
            "failed" => Ok(CallStatus::Failed),
            other => bail!("unknown call status '{other}'"),
        }
    }
}

/// A scheduled phone-call reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub message: String,
    pub phone_number: String,
    /// Absolute due instant, always UTC
    pub scheduled_for: DateTime<Utc>,
    /// IANA zone id, carried for display only
    pub timezone: String,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Build a freshly scheduled reminder with a new id and audit stamps.
    pub fn new(new: NewReminder) -> Self {
        let now = Utc::now();
        Reminder {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            message: new.message,
            phone_number: new.phone_number,
            scheduled_for: new.scheduled_for,
            timezone: new.timezone,
            status: ReminderStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Creation payload for a reminder, validated before it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub title: String,
    pub message: String,
    pub phone_number: String,
    pub scheduled_for: DateTime<Utc>,
    pub timezone: String,
}

impl NewReminder {
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() || self.title.chars().count() > 100 {
            bail!("title must be 1-100 characters");
        }
        if self.message.is_empty() || self.message.chars().count() > 500 {
            bail!("message must be 1-500 characters");
        }
        if !phone_regex().is_match(&self.phone_number) {
            bail!("phone number must be in E.164 format");
        }
        if self.timezone.is_empty() {
            bail!("timezone must not be empty");
        }
        if self.scheduled_for <= Utc::now() {
            bail!("scheduled time must be in the future");
        }
        Ok(())
    }
}

/// Immutable record of one dispatch attempt.
///
/// `response_data` is set only on success, `error_message` only on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub id: String,
    pub reminder_id: String,
    pub attempted_at: DateTime<Utc>,
    pub status: CallStatus,
    pub response_data: Option<String>,
    pub error_message: Option<String>,
}

impl CallLog {
    /// Record a successful attempt with the provider's raw response.
    pub fn success(reminder_id: &str, response_data: String) -> Self {
        CallLog {
            id: Uuid::new_v4().to_string(),
            reminder_id: reminder_id.to_string(),
            attempted_at: Utc::now(),
            status: CallStatus::Success,
            response_data: Some(response_data),
            error_message: None,
        }
    }

    /// Record a failed attempt with a human-readable reason.
    pub fn failure(reminder_id: &str, error_message: String) -> Self {
        CallLog {
            id: Uuid::new_v4().to_string(),
            reminder_id: reminder_id.to_string(),
            attempted_at: Utc::now(),
            status: CallStatus::Failed,
            response_data: None,
            error_message: Some(error_message),
        }
    }
}
