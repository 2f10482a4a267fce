//! Outcome recorder
//!
//! Turns one dispatch result into one durable state change: the reminder's
//! terminal status plus exactly one call-log entry, committed atomically.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use log::warn;
use std::sync::Arc;

use crate::core::model::{CallLog, Reminder, ReminderStatus};
use crate::database::Database;
use crate::features::reminders::events::{EventSink, SchedulerEvent};
use crate::features::reminders::gateway::CallOutcome;

pub struct OutcomeRecorder {
    database: Database,
    events: Arc<dyn EventSink>,
}

impl OutcomeRecorder {
    pub fn new(database: Database, events: Arc<dyn EventSink>) -> Self {
        OutcomeRecorder { database, events }
    }

    /// Persist the outcome of one dispatch attempt.
    ///
    /// A clean `Failure` and an unexpected gateway `Err` both land the
    /// reminder in `Failed`; the distinction only changes the recorded
    /// reason. Returns `Err` only when persistence itself fails; the
    /// caller treats that as a per-item failure and moves on.
    pub async fn record(&self, reminder: &Reminder, result: Result<CallOutcome>) -> Result<()> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Gateway raised an unexpected error for reminder {}: {e:#}", reminder.id);
                CallOutcome::Failure {
                    reason: format!("unexpected gateway error: {e:#}"),
                }
            }
        };

        let (status, log) = match outcome {
            CallOutcome::Success { response } => (
                ReminderStatus::Completed,
                CallLog::success(&reminder.id, response.to_string()),
            ),
            CallOutcome::Failure { reason } => (
                ReminderStatus::Failed,
                CallLog::failure(&reminder.id, reason),
            ),
        };

        self.database
            .record_outcome(&reminder.id, status, &log)
            .await?;

        self.events.emit(SchedulerEvent::ReminderDispatched {
            reminder_id: reminder.id.clone(),
            completed: status == ReminderStatus::Completed,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{CallStatus, NewReminder};
    use anyhow::anyhow;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::sync::Mutex;

    struct CollectSink {
        events: Mutex<Vec<SchedulerEvent>>,
    }

    impl CollectSink {
        fn new() -> Arc<Self> {
            Arc::new(CollectSink {
                events: Mutex::new(Vec::new()),
            })
        }

        fn events(&self) -> Vec<SchedulerEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for CollectSink {
        fn emit(&self, event: SchedulerEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    async fn seeded() -> (Database, Reminder) {
        let db = Database::new(":memory:").await.unwrap();
        let reminder = Reminder::new(NewReminder {
            title: "Pick up parcel".to_string(),
            message: "The parcel shop closes at six.".to_string(),
            phone_number: "+15551234567".to_string(),
            scheduled_for: Utc::now() - Duration::minutes(1),
            timezone: "UTC".to_string(),
        });
        db.insert_reminder(&reminder).await.unwrap();
        (db, reminder)
    }

    #[tokio::test]
    async fn test_success_outcome_completes_reminder() {
        let (db, reminder) = seeded().await;
        let sink = CollectSink::new();
        let recorder = OutcomeRecorder::new(db.clone(), sink.clone());

        let outcome = CallOutcome::Success {
            response: json!({"id": "call-1", "status": "queued"}),
        };
        recorder.record(&reminder, Ok(outcome)).await.unwrap();

        let stored = db.get_reminder(&reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReminderStatus::Completed);

        let logs = db.call_logs_for(&reminder.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, CallStatus::Success);
        let data: serde_json::Value =
            serde_json::from_str(logs[0].response_data.as_deref().unwrap()).unwrap();
        assert_eq!(data["id"], "call-1");
        assert!(logs[0].error_message.is_none());

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SchedulerEvent::ReminderDispatched { completed: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_failure_outcome_fails_reminder() {
        let (db, reminder) = seeded().await;
        let recorder = OutcomeRecorder::new(db.clone(), CollectSink::new());

        let outcome = CallOutcome::Failure {
            reason: "call request timed out after 30s".to_string(),
        };
        recorder.record(&reminder, Ok(outcome)).await.unwrap();

        let stored = db.get_reminder(&reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReminderStatus::Failed);

        let logs = db.call_logs_for(&reminder.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, CallStatus::Failed);
        assert!(logs[0].response_data.is_none());
        assert_eq!(
            logs[0].error_message.as_deref(),
            Some("call request timed out after 30s")
        );
    }

    #[tokio::test]
    async fn test_unexpected_gateway_error_is_forced_to_failed() {
        let (db, reminder) = seeded().await;
        let recorder = OutcomeRecorder::new(db.clone(), CollectSink::new());

        recorder
            .record(&reminder, Err(anyhow!("connection pool poisoned")))
            .await
            .unwrap();

        let stored = db.get_reminder(&reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReminderStatus::Failed);

        let logs = db.call_logs_for(&reminder.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        let message = logs[0].error_message.as_deref().unwrap();
        assert!(message.contains("connection pool poisoned"));
    }
}
