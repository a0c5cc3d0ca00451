//! Notification center: one per process. Wires the pollers to a session
//! token and exposes the entry points the UI and session layer call.

use std::sync::{Arc, Mutex, MutexGuard};

use leadwatch_core::clock::Clock;
use leadwatch_core::config::NotifyConfig;
use leadwatch_core::error::{LeadwatchError, Result};
use leadwatch_core::traits::{AlertSound, ApiConnector};
use leadwatch_core::types::NotificationEnvelope;
use tokio::sync::{broadcast, watch};

use crate::arbiter::{DeliveryRecord, NotificationArbiter};
use crate::badge::BadgeCounterPoller;
use crate::dedup::SessionDedupStore;
use crate::display::{DisplayHub, Toast, ToastLevel};
use crate::feed::FeedCursorPoller;
use crate::reminder::ReminderPoller;
use crate::timers::{BADGE_TIMER, LEAD_TIMER, REMINDER_TIMER, TimerSet};

pub struct NotificationCenter {
    config: NotifyConfig,
    connector: Arc<dyn ApiConnector>,
    clock: Arc<dyn Clock>,
    display: Arc<DisplayHub>,
    arbiter: Arc<NotificationArbiter>,
    dedup: Arc<SessionDedupStore>,
    timers: Mutex<TimerSet>,
}

impl NotificationCenter {
    pub fn new(
        config: NotifyConfig,
        connector: Arc<dyn ApiConnector>,
        clock: Arc<dyn Clock>,
        sound: Arc<dyn AlertSound>,
    ) -> Self {
        let display = Arc::new(DisplayHub::new());
        let arbiter = Arc::new(NotificationArbiter::with_history_limit(
            display.clone(),
            sound,
            config.history_limit,
        ));
        Self {
            config,
            connector,
            clock,
            display,
            arbiter,
            dedup: Arc::new(SessionDedupStore::new()),
            timers: Mutex::new(TimerSet::new()),
        }
    }

    fn timers(&self) -> MutexGuard<'_, TimerSet> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start notifying for a freshly authenticated session.
    ///
    /// Any previous session is torn down first. The reminder window and badge
    /// refresh immediately; lead polling and reminder checks begin one period
    /// later. Must be called from within a tokio runtime.
    pub fn on_session_start(&self, token: &str) -> Result<()> {
        self.teardown();

        if token.trim().is_empty() {
            return Err(LeadwatchError::Session("empty session token".into()));
        }
        let api = self.connector.connect(token)?;
        self.display.clear_session_rejected();
        let cfg = &self.config;

        let reminders = ReminderPoller::new(
            api.clone(),
            self.arbiter.clone(),
            self.dedup.clone(),
            self.clock.clone(),
            cfg.reminder_window_limit,
        );
        let feed = FeedCursorPoller::new(
            api.clone(),
            self.arbiter.clone(),
            self.dedup.clone(),
            self.clock.clone(),
            cfg.lead_page_size,
        );
        let badge = BadgeCounterPoller::new(api, self.display.clone(), cfg.badge_count_limit)
            .with_ticket(self.arbiter.ticket());

        {
            let mut timers = self.timers();
            timers.spawn(
                REMINDER_TIMER,
                reminders.run(cfg.reminder_refresh_every(), cfg.reminder_check_every()),
            );
            timers.spawn(LEAD_TIMER, feed.run(cfg.lead_poll_every()));
            timers.spawn(BADGE_TIMER, badge.run(cfg.badge_poll_every()));
        }

        tracing::info!("🚀 Notification session started ({} timers armed)", self.timers().len());
        self.display.toast(ToastLevel::Success, "Notifications enabled");
        Ok(())
    }

    /// Stop every timer and forget the session. Safe to call repeatedly.
    pub fn on_session_end(&self) {
        self.teardown();
        self.display.publish_badge(0);
        tracing::info!("👋 Notification session ended");
        self.display.toast(ToastLevel::Info, "Notifications stopped");
    }

    // `abort` only lands at a task's next await, so a poll already past its
    // fetch may still run to completion. Ending the arbiter's session first
    // makes that poll's show and mark no-ops.
    fn teardown(&self) {
        self.timers().cancel_all();
        self.arbiter.end_session();
        self.dedup.reset();
    }

    /// Dismiss whatever is showing.
    pub fn request_close(&self) -> bool {
        self.arbiter.close()
    }

    pub fn toast(&self, level: ToastLevel, message: impl Into<String>) {
        self.display.toast(level, message);
    }

    pub fn subscribe_envelope(&self) -> watch::Receiver<Option<NotificationEnvelope>> {
        self.display.subscribe_envelope()
    }

    pub fn subscribe_badge(&self) -> watch::Receiver<u64> {
        self.display.subscribe_badge()
    }

    pub fn subscribe_toasts(&self) -> broadcast::Receiver<Toast> {
        self.display.subscribe_toasts()
    }

    /// Raised when the API rejects the session token. The session layer is
    /// expected to call [`on_session_end`](Self::on_session_end).
    pub fn subscribe_session_rejected(&self) -> watch::Receiver<bool> {
        self.display.subscribe_session_rejected()
    }

    pub fn current(&self) -> Option<NotificationEnvelope> {
        self.arbiter.current()
    }

    pub fn badge(&self) -> u64 {
        self.display.badge()
    }

    pub fn history(&self) -> Vec<DeliveryRecord> {
        self.arbiter.history()
    }

    pub fn dedup(&self) -> &SessionDedupStore {
        &self.dedup
    }

    /// Names of timers that are currently running.
    pub fn armed_timers(&self) -> Vec<&'static str> {
        let timers = self.timers();
        timers.names().into_iter().filter(|name| timers.is_armed(name)).collect()
    }
}
