//! Collaborator traits: the seams between the notifier and the outside world.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{LeadItem, ReminderItem};

/// Read-only view of the admin REST API, bound to one session token.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Upcoming reminders, ordered by scheduled time ascending.
    /// Malformed rows are already dropped.
    async fn fetch_reminders(&self, limit: usize) -> Result<Vec<ReminderItem>>;

    /// Pending leads created at or after `after`, oldest first.
    async fn fetch_leads_since(&self, after: DateTime<Utc>, limit: usize) -> Result<Vec<LeadItem>>;

    /// Number of pending leads, capped at `limit`.
    async fn count_pending_leads(&self, limit: usize) -> Result<u64>;
}

/// Binds an [`AdminApi`] to a session token.
pub trait ApiConnector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn AdminApi>>;
}

/// Audible alert played when a notification is installed.
pub trait AlertSound: Send + Sync {
    fn play(&self);
}

/// No-op alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAlert;

impl AlertSound for SilentAlert {
    fn play(&self) {}
}
