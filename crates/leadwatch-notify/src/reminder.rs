//! Reminder poller: keeps a window of upcoming reminders and raises the
//! one whose `HH:MM` matches the current local minute.
//!
//! Two cadences drive it: the window is refetched every refresh period and
//! matched against the clock every check period. Matching is exact-minute,
//! so a check period longer than 60s can step over a minute entirely.

use std::sync::Arc;
use std::time::Duration;

use leadwatch_core::clock::Clock;
use leadwatch_core::traits::AdminApi;
use leadwatch_core::types::{EntityKind, NotificationEnvelope, ReminderEnvelope, ReminderItem, SessionId};
use tokio::time::{Instant, MissedTickBehavior};

use crate::arbiter::{NotificationArbiter, SessionTicket};
use crate::dedup::SessionDedupStore;
use crate::display::DisplayHub;

pub struct ReminderPoller {
    api: Arc<dyn AdminApi>,
    arbiter: Arc<NotificationArbiter>,
    dedup: Arc<SessionDedupStore>,
    display: Arc<DisplayHub>,
    ticket: SessionTicket,
    clock: Arc<dyn Clock>,
    window_limit: usize,
    window: Vec<ReminderItem>,
}

impl ReminderPoller {
    pub fn new(
        api: Arc<dyn AdminApi>,
        arbiter: Arc<NotificationArbiter>,
        dedup: Arc<SessionDedupStore>,
        clock: Arc<dyn Clock>,
        window_limit: usize,
    ) -> Self {
        Self {
            display: arbiter.display().clone(),
            ticket: arbiter.ticket(),
            api,
            arbiter,
            dedup,
            clock,
            window_limit,
            window: Vec::new(),
        }
    }

    /// The reminders currently held, in server order.
    pub fn window(&self) -> &[ReminderItem] {
        &self.window
    }

    /// Replace the window with a fresh fetch. On failure the previous
    /// window is kept and `false` is returned.
    pub async fn refresh(&mut self) -> bool {
        match self.api.fetch_reminders(self.window_limit).await {
            Ok(items) => {
                tracing::debug!("📋 Reminder window refreshed: {} items", items.len());
                self.window = items;
                true
            }
            Err(e) => {
                tracing::warn!("⚠️ Reminder refresh failed, keeping {} cached: {e}", self.window.len());
                if e.is_unauthorized() && self.ticket.is_live() {
                    self.display.report_session_rejected();
                }
                false
            }
        }
    }

    /// Raise at most one due reminder. Returns the id that was shown.
    pub fn check(&mut self) -> Option<SessionId> {
        if self.window.is_empty() || self.arbiter.is_occupied() {
            return None;
        }
        let now = self.clock.local_now();

        for item in self.window.iter().filter(|item| item.is_due_at(now)) {
            let id = item.session_id();
            if self.dedup.contains(EntityKind::Reminder, &id) {
                continue;
            }
            let envelope = NotificationEnvelope::from(ReminderEnvelope::from(item));
            if self.arbiter.try_show_as(&self.ticket, envelope) {
                self.dedup.mark_as(&self.ticket, EntityKind::Reminder, id.clone());
                return Some(id);
            }
            // Lost the slot to another producer (or the session ended).
            break;
        }
        None
    }

    /// Drive both cadences until the task is aborted.
    ///
    /// The window is fetched immediately (followed by a check); the first
    /// standalone check waits one full check period.
    pub async fn run(mut self, refresh_every: Duration, check_every: Duration) {
        tracing::info!(
            "⏰ Reminder poller started (refresh {}s, check {}s)",
            refresh_every.as_secs(),
            check_every.as_secs()
        );
        let mut refresh = tokio::time::interval(refresh_every);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut check = tokio::time::interval_at(Instant::now() + check_every, check_every);
        check.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    self.refresh().await;
                    self.check();
                }
                _ = check.tick() => {
                    self.check();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayHub;
    use crate::testing::{CountingSound, FakeApi, reminder};
    use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
    use leadwatch_core::clock::ManualClock;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        today().and_hms_opt(h, m, s).unwrap()
    }

    struct Harness {
        api: Arc<FakeApi>,
        arbiter: Arc<NotificationArbiter>,
        dedup: Arc<SessionDedupStore>,
        clock: Arc<ManualClock>,
        poller: ReminderPoller,
    }

    fn harness(now: NaiveDateTime) -> Harness {
        harness_with(ManualClock::at_local(now))
    }

    fn harness_with(clock: ManualClock) -> Harness {
        let api = Arc::new(FakeApi::default());
        let display = Arc::new(DisplayHub::new());
        let arbiter = Arc::new(NotificationArbiter::new(display, Arc::new(CountingSound::default())));
        let dedup = Arc::new(SessionDedupStore::new());
        let clock = Arc::new(clock);
        let poller = ReminderPoller::new(api.clone(), arbiter.clone(), dedup.clone(), clock.clone(), 50);
        Harness {
            api,
            arbiter,
            dedup,
            clock,
            poller,
        }
    }

    #[tokio::test]
    async fn test_due_reminder_shown_once_per_session() {
        let mut h = harness(at(14, 5, 30));
        h.api.set_reminders(vec![reminder("1", today(), "14:05")]);
        assert!(h.poller.refresh().await);

        let shown = h.poller.check().unwrap();
        assert_eq!(shown.as_str(), "reminder:1:2026-03-14:14:05");
        assert!(h.dedup.contains(EntityKind::Reminder, &shown));

        h.arbiter.close();
        assert!(h.poller.check().is_none());
        assert!(!h.arbiter.is_occupied());
    }

    #[tokio::test]
    async fn test_only_exact_minute_on_same_date_matches() {
        let mut h = harness(at(14, 5, 0));
        let tomorrow = today().succ_opt().unwrap();
        h.api.set_reminders(vec![
            reminder("early", today(), "14:04"),
            reminder("late", today(), "14:06"),
            reminder("other-day", tomorrow, "14:05"),
        ]);
        h.poller.refresh().await;
        assert!(h.poller.check().is_none());

        h.clock.set_local(at(14, 6, 59));
        assert_eq!(h.poller.check().unwrap().as_str(), "reminder:late:2026-03-14:14:06");
    }

    #[tokio::test]
    async fn test_one_reminder_per_check_in_window_order() {
        let mut h = harness(at(9, 0, 0));
        h.api.set_reminders(vec![
            reminder("a", today(), "09:00"),
            reminder("b", today(), "09:00"),
        ]);
        h.poller.refresh().await;

        assert_eq!(h.poller.check().unwrap().as_str(), "reminder:a:2026-03-14:09:00");
        // slot still occupied by "a"
        assert!(h.poller.check().is_none());

        h.arbiter.close();
        assert_eq!(h.poller.check().unwrap().as_str(), "reminder:b:2026-03-14:09:00");
        assert_eq!(h.dedup.len(EntityKind::Reminder), 2);
    }

    #[tokio::test]
    async fn test_second_reminder_missed_once_minute_passes() {
        let mut h = harness(at(9, 0, 0));
        h.api.set_reminders(vec![
            reminder("a", today(), "09:00"),
            reminder("b", today(), "09:00"),
        ]);
        h.poller.refresh().await;
        assert_eq!(h.poller.check().unwrap().as_str(), "reminder:a:2026-03-14:09:00");

        // "b" waited out 09:00 behind "a" and is never caught up.
        h.arbiter.close();
        h.clock.set_local(at(9, 1, 0));
        assert!(h.poller.check().is_none());
        assert!(!h.arbiter.is_occupied());
        assert_eq!(h.dedup.len(EntityKind::Reminder), 1);
    }

    #[tokio::test]
    async fn test_reminder_matches_local_date_not_utc() {
        // 20:00 UTC on the 14th is 03:00 on the 15th at +07:00.
        let plus7 = FixedOffset::east_opt(7 * 3600).unwrap();
        let clock = ManualClock::with_offset(Utc.with_ymd_and_hms(2026, 3, 14, 20, 0, 0).unwrap(), plus7);
        let mut h = harness_with(clock);
        let local_day = today().succ_opt().unwrap();
        h.api.set_reminders(vec![
            reminder("utc-day", today(), "03:00"),
            reminder("utc-time", today(), "20:00"),
            reminder("local", local_day, "03:00"),
        ]);
        h.poller.refresh().await;

        assert_eq!(h.poller.check().unwrap().as_str(), "reminder:local:2026-03-15:03:00");
        h.arbiter.close();
        assert!(h.poller.check().is_none());
        assert_eq!(h.dedup.len(EntityKind::Reminder), 1);
    }

    #[tokio::test]
    async fn test_stale_session_reminder_is_not_shown() {
        let mut h = harness(at(9, 0, 0));
        h.api.set_reminders(vec![reminder("a", today(), "09:00")]);
        h.poller.refresh().await;

        h.arbiter.end_session();
        assert!(h.poller.check().is_none());
        assert!(!h.arbiter.is_occupied());
        assert!(h.dedup.is_empty());
    }

    #[tokio::test]
    async fn test_occupied_slot_defers_without_marking() {
        let mut h = harness(at(9, 0, 0));
        h.api.set_reminders(vec![reminder("a", today(), "09:00")]);
        h.poller.refresh().await;

        let lead = crate::testing::lead("busy", 0);
        assert!(h.arbiter.try_show(NotificationEnvelope::Lead((&lead).into())));
        assert!(h.poller.check().is_none());
        assert!(h.dedup.is_empty());

        h.arbiter.close();
        assert!(h.poller.check().is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_window() {
        let mut h = harness(at(9, 0, 0));
        h.api.set_reminders(vec![reminder("a", today(), "09:00")]);
        assert!(h.poller.refresh().await);

        h.api.set_fail(true);
        assert!(!h.poller.refresh().await);
        assert_eq!(h.poller.window().len(), 1);
        assert!(h.poller.check().is_some());
    }

    #[tokio::test]
    async fn test_refresh_replaces_window_wholesale() {
        let mut h = harness(at(9, 0, 0));
        h.api.set_reminders(vec![reminder("a", today(), "09:00"), reminder("b", today(), "10:00")]);
        h.poller.refresh().await;
        h.api.set_reminders(vec![reminder("c", today(), "11:00")]);
        h.poller.refresh().await;

        let ids: Vec<_> = h.poller.window().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[tokio::test]
    async fn test_empty_window_never_touches_arbiter() {
        let mut h = harness(at(9, 0, 0));
        assert!(h.poller.check().is_none());
        assert!(h.arbiter.history().is_empty());
    }
}
