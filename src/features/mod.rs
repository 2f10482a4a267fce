//! # Features Module
//!
//! Feature modules of the reminder dispatch service.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod reminders;

// Re-export feature items
pub use reminders::{
    CallOutcome, EventSink, LogSink, NotificationGateway, OutcomeRecorder, ReminderScheduler,
    SchedulerEvent, VapiClient,
};
