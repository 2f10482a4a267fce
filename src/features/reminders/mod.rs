//! # Reminders Feature
//!
//! Due-reminder detection and phone-call dispatch.
//!
//! The scheduler polls the database on a fixed cadence, places one outbound
//! call per due reminder through the notification gateway, and records each
//! outcome durably. One dispatch attempt per reminder; the result is final.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Structured scheduler events via EventSink
//! - 1.1.0: Gateway trait seam for alternate call providers
//! - 1.0.0: Initial release with Vapi dispatch

pub mod events;
pub mod gateway;
pub mod recorder;
pub mod scheduler;

pub use events::{EventSink, LogSink, SchedulerEvent};
pub use gateway::{CallOutcome, NotificationGateway, VapiClient};
pub use recorder::OutcomeRecorder;
pub use scheduler::ReminderScheduler;
