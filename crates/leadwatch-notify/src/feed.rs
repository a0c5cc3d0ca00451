//! Feed cursor poller: watches the append-only lead feed through a
//! timestamp watermark that only ever moves forward.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use leadwatch_core::clock::Clock;
use leadwatch_core::traits::AdminApi;
use leadwatch_core::types::{EntityKind, LeadEnvelope, LeadItem, NotificationEnvelope, SessionId};
use tokio::time::{Instant, MissedTickBehavior};

use crate::arbiter::{NotificationArbiter, SessionTicket};
use crate::dedup::SessionDedupStore;
use crate::display::DisplayHub;

/// What a single poll did.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Slot was occupied; no request made, cursor untouched.
    Skipped,
    /// Request failed; cursor untouched.
    Failed,
    /// Nothing newer than the cursor. Cursor moved to the poll start.
    Quiet,
    /// `fresh` leads newer than the cursor; `notified` is the one shown, if any.
    Batch {
        fresh: usize,
        notified: Option<SessionId>,
    },
}

pub struct FeedCursorPoller {
    api: Arc<dyn AdminApi>,
    arbiter: Arc<NotificationArbiter>,
    dedup: Arc<SessionDedupStore>,
    display: Arc<DisplayHub>,
    ticket: SessionTicket,
    clock: Arc<dyn Clock>,
    page_size: usize,
    cursor: DateTime<Utc>,
}

impl FeedCursorPoller {
    /// The cursor starts at the clock's current instant, so leads created
    /// before the session began never notify.
    pub fn new(
        api: Arc<dyn AdminApi>,
        arbiter: Arc<NotificationArbiter>,
        dedup: Arc<SessionDedupStore>,
        clock: Arc<dyn Clock>,
        page_size: usize,
    ) -> Self {
        let cursor = clock.now();
        Self {
            display: arbiter.display().clone(),
            ticket: arbiter.ticket(),
            api,
            arbiter,
            dedup,
            clock,
            page_size,
            cursor,
        }
    }

    pub fn cursor(&self) -> DateTime<Utc> {
        self.cursor
    }

    fn advance_to(&mut self, candidate: DateTime<Utc>) {
        self.cursor = self.cursor.max(candidate);
    }

    pub async fn poll(&mut self) -> PollOutcome {
        if self.arbiter.is_occupied() {
            tracing::debug!("⏸️ Slot busy, skipping lead poll");
            return PollOutcome::Skipped;
        }

        let started = self.clock.now();
        let batch = match self.api.fetch_leads_since(self.cursor, self.page_size).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("⚠️ Lead poll failed (cursor stays at {}): {e}", self.cursor);
                if e.is_unauthorized() && self.ticket.is_live() {
                    self.display.report_session_rejected();
                }
                return PollOutcome::Failed;
            }
        };

        // The server's boundary is inclusive; leads at exactly the cursor were seen last time.
        let mut fresh: Vec<LeadItem> = batch
            .into_iter()
            .filter(|lead| lead.created_at > self.cursor)
            .collect();

        if fresh.is_empty() {
            self.advance_to(started);
            return PollOutcome::Quiet;
        }

        fresh.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let newest = fresh[0].created_at;

        let notified = fresh
            .iter()
            .find(|lead| !self.dedup.contains(EntityKind::Lead, &lead.session_id()))
            .and_then(|lead| self.notify(lead));

        self.advance_to(newest);
        tracing::debug!(
            "📥 {} new lead(s), cursor now {}{}",
            fresh.len(),
            self.cursor,
            notified.as_ref().map(|id| format!(", showed {id}")).unwrap_or_default()
        );
        PollOutcome::Batch {
            fresh: fresh.len(),
            notified,
        }
    }

    fn notify(&self, lead: &LeadItem) -> Option<SessionId> {
        let id = lead.session_id();
        let envelope = NotificationEnvelope::from(LeadEnvelope::from(lead));
        if self.arbiter.try_show_as(&self.ticket, envelope) {
            self.dedup.mark_as(&self.ticket, EntityKind::Lead, id.clone());
            Some(id)
        } else {
            None
        }
    }

    /// Poll every `every`, starting one period after the call.
    pub async fn run(mut self, every: Duration) {
        tracing::info!("📡 Lead feed poller started (every {}s)", every.as_secs());
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.poll().await;
        }
    }
}
