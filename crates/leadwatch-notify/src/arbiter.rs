//! Notification arbiter: the single display slot every producer goes through.
//!
//! Occupancy check and install happen under one lock with no `.await` in
//! between, so concurrent producers can never both win.
//!
//! Producers hold a [`SessionTicket`] for the session they were built in.
//! [`NotificationArbiter::end_session`] invalidates every outstanding ticket
//! before clearing the slot, so a poll that was already past its fetch when
//! the session changed cannot install anything afterwards.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use leadwatch_core::traits::AlertSound;
use leadwatch_core::types::{EntityKind, NotificationEnvelope, SessionId};
use serde::{Deserialize, Serialize};

use crate::display::DisplayHub;

/// Default number of deliveries kept in the history ring buffer.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A notification that made it onto the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub session_id: SessionId,
    pub kind: EntityKind,
    pub shown_at: DateTime<Utc>,
}

/// Proof that a producer belongs to the session it was issued in.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    epoch: Arc<AtomicU64>,
    issued: u64,
}

impl SessionTicket {
    /// False once the session that issued this ticket has ended.
    pub fn is_live(&self) -> bool {
        self.epoch.load(Ordering::SeqCst) == self.issued
    }
}

struct Slot {
    active: Option<NotificationEnvelope>,
    /// In-memory ring buffer of deliveries.
    history: VecDeque<DeliveryRecord>,
    history_limit: usize,
}

impl Slot {
    fn record(&mut self, envelope: &NotificationEnvelope) {
        if self.history_limit == 0 {
            return;
        }
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(DeliveryRecord {
            session_id: envelope.session_id().clone(),
            kind: envelope.kind(),
            shown_at: Utc::now(),
        });
    }
}

/// Holds at most one active envelope.
pub struct NotificationArbiter {
    slot: Mutex<Slot>,
    epoch: Arc<AtomicU64>,
    sound: Arc<dyn AlertSound>,
    display: Arc<DisplayHub>,
}

impl NotificationArbiter {
    pub fn new(display: Arc<DisplayHub>, sound: Arc<dyn AlertSound>) -> Self {
        Self::with_history_limit(display, sound, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(
        display: Arc<DisplayHub>,
        sound: Arc<dyn AlertSound>,
        history_limit: usize,
    ) -> Self {
        Self {
            slot: Mutex::new(Slot {
                active: None,
                history: VecDeque::with_capacity(history_limit.min(DEFAULT_HISTORY_LIMIT)),
                history_limit,
            }),
            epoch: Arc::new(AtomicU64::new(0)),
            sound,
            display,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ticket for the current session.
    pub fn ticket(&self) -> SessionTicket {
        SessionTicket {
            epoch: self.epoch.clone(),
            issued: self.epoch.load(Ordering::SeqCst),
        }
    }

    /// Install `envelope` iff nothing is showing. Plays the alert and
    /// notifies the display on success.
    pub fn try_show(&self, envelope: NotificationEnvelope) -> bool {
        self.try_show_as(&self.ticket(), envelope)
    }

    /// Like [`try_show`](Self::try_show), but refused when `ticket`'s
    /// session has ended.
    pub fn try_show_as(&self, ticket: &SessionTicket, envelope: NotificationEnvelope) -> bool {
        {
            let mut slot = self.lock();
            if !ticket.is_live() {
                tracing::debug!("🚫 Dropping {} from an ended session", envelope.session_id());
                return false;
            }
            if let Some(active) = &slot.active {
                tracing::debug!(
                    "⏳ Slot busy with {}, rejecting {}",
                    active.session_id(),
                    envelope.session_id()
                );
                return false;
            }
            tracing::info!("🔔 Showing {} notification {}", envelope.kind(), envelope.session_id());
            slot.record(&envelope);
            slot.active = Some(envelope.clone());
            // Published under the lock so signal order matches slot order.
            self.display.publish_envelope(Some(envelope));
        }
        self.sound.play();
        true
    }

    /// Clear the slot. Idempotent; returns whether anything was showing.
    pub fn close(&self) -> bool {
        let mut slot = self.lock();
        match slot.active.take() {
            Some(envelope) => {
                tracing::debug!("✖️ Closed {}", envelope.session_id());
                self.display.publish_envelope(None);
                true
            }
            None => false,
        }
    }

    /// Invalidate all tickets, then clear the slot and history.
    pub fn end_session(&self) {
        // Bumped before taking the lock: an install racing with us either
        // sees the new epoch or lands first and is cleared below.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut slot = self.lock();
        if slot.active.take().is_some() {
            self.display.publish_envelope(None);
        }
        slot.history.clear();
    }

    pub fn display(&self) -> &Arc<DisplayHub> {
        &self.display
    }

    pub fn is_occupied(&self) -> bool {
        self.lock().active.is_some()
    }

    pub fn current(&self) -> Option<NotificationEnvelope> {
        self.lock().active.clone()
    }

    /// Deliveries so far, oldest first.
    pub fn history(&self) -> Vec<DeliveryRecord> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }
}
