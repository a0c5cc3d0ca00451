//! # Leadwatch Notify
//!
//! Session-scoped notification scheduler for the admin dashboard.
//!
//! ## Architecture
//! ```text
//! NotificationCenter (one per process)
//!   ├── TimerSet: named, cancellable tokio tasks
//!   │     ├── "reminders": refresh window every 60s + check every 100s
//!   │     ├── "lead-feed": cursor poll every 20s
//!   │     └── "badge":     pending count every 60s
//!   ├── SessionDedupStore: notified reminder / lead ids (reset on login/logout)
//!   ├── NotificationArbiter: single slot, at most one envelope active
//!   └── DisplayHub: envelope signal, badge signal, toast channel
//! ```
//!
//! Pollers fetch first and only then call the arbiter's synchronous
//! `try_show`, so the occupancy decision is never split across an `.await`.

pub mod arbiter;
pub mod badge;
pub mod center;
pub mod dedup;
pub mod display;
pub mod feed;
pub mod reminder;
pub mod timers;

#[cfg(test)]
pub(crate) mod testing;

pub use arbiter::{DeliveryRecord, NotificationArbiter};
pub use badge::BadgeCounterPoller;
pub use center::NotificationCenter;
pub use dedup::SessionDedupStore;
pub use display::{DisplayHub, Toast, ToastLevel};
pub use feed::{FeedCursorPoller, PollOutcome};
pub use reminder::ReminderPoller;
pub use timers::TimerSet;
