//! Display hub: what the UI layer subscribes to.
//!
//! - envelope: `watch` signal of the active notification (or none)
//! - badge: `watch` signal of the pending-lead count
//! - toasts: `broadcast` of short transient messages, never gated by the arbiter
//! - session_rejected: `watch` flag raised when the API answers 401/403, so
//!   the session layer can end the session

use chrono::{DateTime, Utc};
use leadwatch_core::types::NotificationEnvelope;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

/// Toasts buffered per subscriber before the slowest one starts lagging.
const TOAST_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

pub struct DisplayHub {
    envelope: watch::Sender<Option<NotificationEnvelope>>,
    badge: watch::Sender<u64>,
    toasts: broadcast::Sender<Toast>,
    session_rejected: watch::Sender<bool>,
}

impl DisplayHub {
    pub fn new() -> Self {
        let (envelope, _) = watch::channel(None);
        let (badge, _) = watch::channel(0);
        let (toasts, _) = broadcast::channel(TOAST_CAPACITY);
        let (session_rejected, _) = watch::channel(false);
        Self {
            envelope,
            badge,
            toasts,
            session_rejected,
        }
    }

    pub fn publish_envelope(&self, envelope: Option<NotificationEnvelope>) {
        self.envelope.send_replace(envelope);
    }

    /// Publish the badge count. Subscribers only wake when it changes.
    pub fn publish_badge(&self, count: u64) {
        self.badge.send_if_modified(|current| {
            if *current == count {
                false
            } else {
                *current = count;
                true
            }
        });
    }

    pub fn toast(&self, level: ToastLevel, message: impl Into<String>) {
        // No subscribers is fine: nobody is looking.
        let _ = self.toasts.send(Toast::new(level, message));
    }

    /// Flag the session token as rejected. Signals once until cleared.
    pub fn report_session_rejected(&self) {
        self.session_rejected
            .send_if_modified(|rejected| !std::mem::replace(rejected, true));
    }

    pub fn clear_session_rejected(&self) {
        self.session_rejected
            .send_if_modified(|rejected| std::mem::replace(rejected, false));
    }

    pub fn session_rejected(&self) -> bool {
        *self.session_rejected.borrow()
    }

    pub fn subscribe_session_rejected(&self) -> watch::Receiver<bool> {
        self.session_rejected.subscribe()
    }

    pub fn envelope(&self) -> Option<NotificationEnvelope> {
        self.envelope.borrow().clone()
    }

    pub fn badge(&self) -> u64 {
        *self.badge.borrow()
    }

    pub fn subscribe_envelope(&self) -> watch::Receiver<Option<NotificationEnvelope>> {
        self.envelope.subscribe()
    }

    pub fn subscribe_badge(&self) -> watch::Receiver<u64> {
        self.badge.subscribe()
    }

    pub fn subscribe_toasts(&self) -> broadcast::Receiver<Toast> {
        self.toasts.subscribe()
    }
}

impl Default for DisplayHub {
    fn default() -> Self {
        Self::new()
    }
}
