//! Named periodic tasks owned by the notification center.
//!
//! Each poller runs inside one spawned task; dropping or cancelling the set
//! aborts them, so no poll can outlive the session token it was built with.

use std::future::Future;

use tokio::task::JoinHandle;

pub const REMINDER_TIMER: &str = "reminders";
pub const LEAD_TIMER: &str = "lead-feed";
pub const BADGE_TIMER: &str = "badge";

#[derive(Default)]
pub struct TimerSet {
    timers: Vec<(&'static str, JoinHandle<()>)>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` under `name`. An existing timer with that name is aborted first.
    pub fn spawn<F>(&mut self, name: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel(name);
        self.timers.push((name, tokio::spawn(fut)));
        tracing::debug!("⏱️ Timer '{name}' armed");
    }

    pub fn is_armed(&self, name: &str) -> bool {
        self.timers.iter().any(|(n, handle)| *n == name && !handle.is_finished())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.timers.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Abort the timer called `name`. Returns whether one existed.
    pub fn cancel(&mut self, name: &str) -> bool {
        match self.timers.iter().position(|(n, _)| *n == name) {
            Some(idx) => {
                let (_, handle) = self.timers.swap_remove(idx);
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        if self.timers.is_empty() {
            return;
        }
        for (name, handle) in self.timers.drain(..) {
            handle.abort();
            tracing::debug!("⏹️ Timer '{name}' cancelled");
        }
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        for (_, handle) in &self.timers {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ticking(counter: Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_stops_ticking() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut timers = TimerSet::new();
        timers.spawn(BADGE_TIMER, ticking(counter.clone()));
        assert!(timers.is_armed(BADGE_TIMER));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        timers.cancel_all();
        assert!(timers.is_empty());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_respawn_replaces_same_name() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut timers = TimerSet::new();
        timers.spawn(LEAD_TIMER, ticking(first.clone()));
        timers.spawn(LEAD_TIMER, ticking(second.clone()));
        assert_eq!(timers.names(), vec![LEAD_TIMER]);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut timers = TimerSet::new();
            timers.spawn(REMINDER_TIMER, ticking(counter.clone()));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }
}
