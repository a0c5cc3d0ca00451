//! Pending-lead badge. Independent of the arbiter and dedup store.

use std::sync::Arc;
use std::time::Duration;

use leadwatch_core::traits::AdminApi;
use tokio::time::MissedTickBehavior;

use crate::arbiter::SessionTicket;
use crate::display::DisplayHub;

pub struct BadgeCounterPoller {
    api: Arc<dyn AdminApi>,
    display: Arc<DisplayHub>,
    limit: usize,
    ticket: Option<SessionTicket>,
}

impl BadgeCounterPoller {
    pub fn new(api: Arc<dyn AdminApi>, display: Arc<DisplayHub>, limit: usize) -> Self {
        Self {
            api,
            display,
            limit,
            ticket: None,
        }
    }

    /// Tie auth failure reports to a session; stale ones are ignored.
    pub fn with_ticket(mut self, ticket: SessionTicket) -> Self {
        self.ticket = Some(ticket);
        self
    }

    /// Fetch and publish the pending count. Errors publish `0`.
    pub async fn refresh(&self) -> u64 {
        let count = match self.api.count_pending_leads(self.limit).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("⚠️ Pending count failed, badge reset: {e}");
                let live = self.ticket.as_ref().is_none_or(SessionTicket::is_live);
                if e.is_unauthorized() && live {
                    self.display.report_session_rejected();
                }
                0
            }
        };
        self.display.publish_badge(count);
        count
    }

    /// Refresh immediately, then every `every`.
    pub async fn run(self, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.refresh().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_publishes_count_and_zero_on_error() {
        let api = Arc::new(FakeApi::default());
        *api.pending_count.lock().unwrap() = 12;
        let display = Arc::new(DisplayHub::new());
        let badge = BadgeCounterPoller::new(api.clone(), display.clone(), 1000);

        assert_eq!(badge.refresh().await, 12);
        assert_eq!(display.badge(), 12);

        api.set_fail(true);
        assert_eq!(badge.refresh().await, 0);
        assert_eq!(display.badge(), 0);
        assert_eq!(api.count_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_flags_session_rejected() {
        let api = Arc::new(FakeApi::default());
        let display = Arc::new(DisplayHub::new());
        let badge = BadgeCounterPoller::new(api.clone(), display.clone(), 1000);

        api.set_fail(true);
        badge.refresh().await;
        assert!(!display.session_rejected());

        api.set_unauthorized(true);
        assert_eq!(badge.refresh().await, 0);
        assert!(display.session_rejected());
    }

    #[tokio::test]
    async fn test_count_capped_by_limit() {
        let api = Arc::new(FakeApi::default());
        *api.pending_count.lock().unwrap() = 5000;
        let display = Arc::new(DisplayHub::new());

        BadgeCounterPoller::new(api, display.clone(), 1000).refresh().await;
        assert_eq!(display.badge(), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_refreshes_eagerly_then_periodically() {
        let api = Arc::new(FakeApi::default());
        let display = Arc::new(DisplayHub::new());
        let task = tokio::spawn(
            BadgeCounterPoller::new(api.clone(), display, 1000).run(Duration::from_secs(60)),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.count_calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.count_calls.load(Ordering::SeqCst), 2);
        task.abort();
    }
}
