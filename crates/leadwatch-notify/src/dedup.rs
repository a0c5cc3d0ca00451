//! Session dedup store: which reminders and leads already raised a
//! notification during the current login.
//!
//! In-memory only. Grows for the life of the session and is wiped by
//! [`SessionDedupStore::reset`] on login and logout.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use leadwatch_core::types::{EntityKind, SessionId};

use crate::arbiter::SessionTicket;

#[derive(Debug, Default)]
struct DedupSets {
    reminders: HashSet<SessionId>,
    leads: HashSet<SessionId>,
}

impl DedupSets {
    fn set(&self, kind: EntityKind) -> &HashSet<SessionId> {
        match kind {
            EntityKind::Reminder => &self.reminders,
            EntityKind::Lead => &self.leads,
        }
    }

    fn set_mut(&mut self, kind: EntityKind) -> &mut HashSet<SessionId> {
        match kind {
            EntityKind::Reminder => &mut self.reminders,
            EntityKind::Lead => &mut self.leads,
        }
    }
}

/// Per-kind sets of already-notified session ids.
#[derive(Debug, Default)]
pub struct SessionDedupStore {
    inner: Mutex<DedupSets>,
}

impl SessionDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DedupSets> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn contains(&self, kind: EntityKind, id: &SessionId) -> bool {
        self.lock().set(kind).contains(id)
    }

    /// Record `id` as notified. Returns `false` if it was already there.
    pub fn mark(&self, kind: EntityKind, id: SessionId) -> bool {
        self.lock().set_mut(kind).insert(id)
    }

    /// [`mark`](Self::mark) on behalf of a producer; ignored once the
    /// ticket's session has ended.
    pub fn mark_as(&self, ticket: &SessionTicket, kind: EntityKind, id: SessionId) -> bool {
        let mut sets = self.lock();
        if !ticket.is_live() {
            return false;
        }
        sets.set_mut(kind).insert(id)
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.lock().set(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        let sets = self.lock();
        sets.reminders.is_empty() && sets.leads.is_empty()
    }

    /// Forget everything. Called on login and logout.
    pub fn reset(&self) {
        let mut sets = self.lock();
        let cleared = sets.reminders.len() + sets.leads.len();
        sets.reminders.clear();
        sets.leads.clear();
        tracing::debug!("🧹 Dedup store reset ({cleared} ids dropped)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::NotificationArbiter;
    use crate::display::DisplayHub;
    use leadwatch_core::traits::SilentAlert;
    use std::sync::Arc;

    #[test]
    fn test_kinds_are_independent() {
        let store = SessionDedupStore::new();
        let id = SessionId::lead("7");
        assert!(store.mark(EntityKind::Lead, id.clone()));
        assert!(store.contains(EntityKind::Lead, &id));
        assert!(!store.contains(EntityKind::Reminder, &id));
        assert_eq!(store.len(EntityKind::Reminder), 0);
    }

    #[test]
    fn test_mark_twice_reports_duplicate() {
        let store = SessionDedupStore::new();
        assert!(store.mark(EntityKind::Lead, SessionId::lead("1")));
        assert!(!store.mark(EntityKind::Lead, SessionId::lead("1")));
        assert_eq!(store.len(EntityKind::Lead), 1);
    }

    #[test]
    fn test_mark_with_stale_ticket_is_ignored() {
        let arbiter = NotificationArbiter::new(Arc::new(DisplayHub::new()), Arc::new(SilentAlert));
        let store = SessionDedupStore::new();
        let ticket = arbiter.ticket();
        assert!(store.mark_as(&ticket, EntityKind::Lead, SessionId::lead("1")));

        arbiter.end_session();
        store.reset();
        assert!(!store.mark_as(&ticket, EntityKind::Lead, SessionId::lead("2")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reset_clears_both_sets() {
        let store = SessionDedupStore::new();
        store.mark(EntityKind::Lead, SessionId::lead("1"));
        store.mark(
            EntityKind::Reminder,
            SessionId::reminder("2", chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(), "09:00"),
        );
        assert!(!store.is_empty());

        store.reset();
        assert!(store.is_empty());
        assert!(!store.contains(EntityKind::Lead, &SessionId::lead("1")));
    }
}
