//! Due-reminder poller
//!
//! A single spawned task drives the check-and-dispatch cycle on a fixed
//! cadence. One tick: sample `now` once, query reminders that are still
//! scheduled and due, then dispatch them sequentially. A failure for one
//! reminder never aborts the rest of the batch, and because one task owns
//! the loop, two ticks can never run concurrently; a tick that overruns
//! the interval simply causes the next one to be skipped.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Structured events, watch-based shutdown
//! - 1.1.0: Injected gateway trait object
//! - 1.0.0: Initial polling loop

use chrono::Utc;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::model::Reminder;
use crate::database::Database;
use crate::features::reminders::events::{EventSink, SchedulerEvent};
use crate::features::reminders::gateway::NotificationGateway;
use crate::features::reminders::recorder::OutcomeRecorder;

/// Reference cadence: one due-reminder check every 30 seconds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background poller that dispatches due reminders.
///
/// Owns its collaborators by injection; construct once at process start,
/// then `start()` at boot and `stop().await` at shutdown. Both are
/// idempotent.
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct SchedulerInner {
    database: Database,
    gateway: Arc<dyn NotificationGateway>,
    recorder: OutcomeRecorder,
    events: Arc<dyn EventSink>,
    interval: Duration,
    running: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl ReminderScheduler {
    pub fn new(
        database: Database,
        gateway: Arc<dyn NotificationGateway>,
        events: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let recorder = OutcomeRecorder::new(database.clone(), events.clone());
        ReminderScheduler {
            inner: Arc::new(SchedulerInner {
                database,
                gateway,
                recorder,
                events,
                interval,
                running: AtomicBool::new(false),
                shutdown,
            }),
            handle: Mutex::new(None),
        }
    }

    /// Begin ticking. The first tick runs immediately, which drains any
    /// backlog that accumulated while the process was down.
    pub async fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Reminder scheduler already running");
            return;
        }

        // Subscribe before spawning so a stop() issued right after start()
        // cannot slip past an unsubscribed loop.
        let shutdown = self.inner.shutdown.subscribe();
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move { inner.run(shutdown).await });
        *self.handle.lock().await = Some(handle);
        self.inner.events.emit(SchedulerEvent::SchedulerStarted);
    }

    /// Halt future ticks and wait for any in-flight tick to finish. An
    /// in-flight call request is not cancelled; it completes or times out
    /// on its own bound.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let _ = self.inner.shutdown.send(true);
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.inner.events.emit(SchedulerEvent::SchedulerStopped);
    }
}

impl SchedulerInner {
    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // A tick that overruns its slot skips the missed firings instead of
        // bursting to catch up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            self.tick().await;
        }
        debug!("Reminder scheduler loop exited");
    }

    /// One check-and-dispatch cycle.
    async fn tick(&self) {
        let now = Utc::now();
        let due = match self.database.due_reminders(now).await {
            Ok(due) => due,
            Err(e) => {
                // Nothing was touched; the next tick retries from scratch.
                self.events.emit(SchedulerEvent::TickAborted {
                    reason: format!("{e:#}"),
                });
                return;
            }
        };

        self.events.emit(SchedulerEvent::TickStarted {
            at: now,
            due: due.len(),
        });

        for reminder in due {
            self.dispatch(reminder).await;
        }
    }

    /// Dispatch one reminder. Never propagates: whatever goes wrong here
    /// is confined to this reminder.
    async fn dispatch(&self, reminder: Reminder) {
        info!("Dispatching reminder {} ({})", reminder.id, reminder.title);
        let result = self
            .gateway
            .place_call(&reminder.phone_number, &reminder.message)
            .await;

        if let Err(e) = self.recorder.record(&reminder, result).await {
            // Commit failed, so the reminder is still scheduled; a later
            // tick re-selects it.
            self.events.emit(SchedulerEvent::DispatchFailed {
                reminder_id: reminder.id.clone(),
                reason: format!("{e:#}"),
            });
        }
    }
}
