//! Structured scheduler events
//!
//! The poller and outcome recorder report what they do through an
//! [`EventSink`] rather than printing; the host picks the sink and format.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.2.0

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

/// Events emitted by the dispatch engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SchedulerEvent {
    /// Poller began ticking
    SchedulerStarted,
    /// Poller stopped; no further ticks will run
    SchedulerStopped,
    /// A tick sampled `at` and found `due` reminders to process
    TickStarted {
        at: DateTime<Utc>,
        due: usize,
    },
    /// The due-reminder query failed; nothing was dispatched this tick
    TickAborted {
        reason: String,
    },
    /// A reminder reached a terminal state and its call log was written
    ReminderDispatched {
        reminder_id: String,
        completed: bool,
    },
    /// A reminder's outcome could not be recorded; it stays as-is for a
    /// later tick
    DispatchFailed {
        reminder_id: String,
        reason: String,
    },
}

/// Where scheduler events go. Implementations must be cheap and
/// non-blocking; they run inline on the poller task.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SchedulerEvent);
}

/// Default sink: routes events to the `log` crate.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: SchedulerEvent) {
        match &event {
            SchedulerEvent::SchedulerStarted => info!("Reminder scheduler started"),
            SchedulerEvent::SchedulerStopped => info!("Reminder scheduler stopped"),
            SchedulerEvent::TickStarted { at, due } => {
                if *due == 0 {
                    debug!("Tick at {at}: no due reminders");
                } else {
                    info!("Tick at {at}: {due} due reminder(s)");
                }
            }
            SchedulerEvent::TickAborted { reason } => {
                error!("Tick aborted, due-reminder query failed: {reason}");
            }
            SchedulerEvent::ReminderDispatched {
                reminder_id,
                completed,
            } => {
                if *completed {
                    info!("Reminder {reminder_id} completed");
                } else {
                    warn!("Reminder {reminder_id} failed");
                }
            }
            SchedulerEvent::DispatchFailed {
                reminder_id,
                reason,
            } => {
                error!("Could not record outcome for reminder {reminder_id}: {reason}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_tagged() {
        let event = SchedulerEvent::ReminderDispatched {
            reminder_id: "r-1".to_string(),
            completed: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ReminderDispatched");
        assert_eq!(json["reminder_id"], "r-1");
        assert_eq!(json["completed"], true);
    }
}
