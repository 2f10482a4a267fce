// Core layer - shared types and configuration
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

// Re-export core config and domain types
pub use core::{CallLog, CallStatus, Config, NewReminder, Reminder, ReminderStatus};

// Re-export feature items
pub use features::{
    // Reminders
    CallOutcome, EventSink, LogSink, NotificationGateway, OutcomeRecorder, ReminderScheduler,
    SchedulerEvent, VapiClient,
};

// Re-export database handle
pub use database::Database;
