//! # Core Module
//!
//! Core domain types and configuration for the reminder dispatch service.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.7.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add model module with reminder and call-log domain types
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod model;

// Re-export commonly used items
pub use config::Config;
pub use model::{CallLog, CallStatus, NewReminder, Reminder, ReminderStatus};
