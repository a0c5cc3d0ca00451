//! Domain types: the data model the pollers consume and the display renders.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder subject when a reminder carries no usable name.
pub const UNKNOWN_SUBJECT: &str = "Unknown contact";

/// Kinds of entity that can raise a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Reminder,
    Lead,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Reminder => write!(f, "reminder"),
            EntityKind::Lead => write!(f, "lead"),
        }
    }
}

/// Identity of one notification occurrence.
///
/// Deterministic for a given entity and trigger, so the same reminder slot or
/// lead always maps to the same key: `reminder:{id}:{date}:{time}` or
/// `lead:{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn reminder(id: &str, date: NaiveDate, time: &str) -> Self {
        Self(format!("reminder:{id}:{}:{time}", date.format("%Y-%m-%d")))
    }

    pub fn lead(id: &str) -> Self {
        Self(format!("lead:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format a local wall time as the `HH:MM` string reminders are keyed on.
pub fn format_hhmm(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

/// A scheduled reminder, as held in the poller's window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderItem {
    pub id: String,
    /// Zero-padded local time of day, `HH:MM`.
    pub scheduled_time: String,
    /// Local calendar date.
    pub scheduled_date: NaiveDate,
    /// Name of the lead/person this reminder is linked to.
    pub linked_name: Option<String>,
    /// Free-text contact name typed on the reminder itself.
    pub contact_name: Option<String>,
    pub note: String,
    pub phone: Option<String>,
}

impl ReminderItem {
    pub fn session_id(&self) -> SessionId {
        SessionId::reminder(&self.id, self.scheduled_date, &self.scheduled_time)
    }

    /// Display name: linked person, then free-text name, then a placeholder.
    pub fn subject_name(&self) -> &str {
        [self.linked_name.as_deref(), self.contact_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_SUBJECT)
    }

    /// Exact minute match on the local calendar date and `HH:MM`.
    pub fn is_due_at(&self, local_now: NaiveDateTime) -> bool {
        self.scheduled_date == local_now.date() && self.scheduled_time == format_hhmm(local_now)
    }
}

/// Lead pipeline status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    Pending,
    Contacted,
    Enrolled,
    Rejected,
    Other(String),
}

impl LeadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::Pending => "PENDING",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::Enrolled => "ENROLLED",
            LeadStatus::Rejected => "REJECTED",
            LeadStatus::Other(s) => s,
        }
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => LeadStatus::Pending,
            "CONTACTED" => LeadStatus::Contacted,
            "ENROLLED" => LeadStatus::Enrolled,
            "REJECTED" => LeadStatus::Rejected,
            _ => LeadStatus::Other(s),
        }
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming lead from the append-only feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub applicant_name: String,
    pub phone: String,
    pub course_name: Option<String>,
    pub status: LeadStatus,
}

impl LeadItem {
    pub fn session_id(&self) -> SessionId {
        SessionId::lead(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEnvelope {
    pub session_id: SessionId,
    pub title: String,
    pub scheduled_time: String,
    pub subject_name: String,
    pub note: String,
    pub phone: Option<String>,
}

impl From<&ReminderItem> for ReminderEnvelope {
    fn from(item: &ReminderItem) -> Self {
        Self {
            session_id: item.session_id(),
            title: format!("Reminder at {}", item.scheduled_time),
            scheduled_time: item.scheduled_time.clone(),
            subject_name: item.subject_name().to_string(),
            note: item.note.clone(),
            phone: item.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadEnvelope {
    pub session_id: SessionId,
    pub applicant_name: String,
    pub phone: String,
    pub course_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&LeadItem> for LeadEnvelope {
    fn from(lead: &LeadItem) -> Self {
        Self {
            session_id: lead.session_id(),
            applicant_name: lead.applicant_name.clone(),
            phone: lead.phone.clone(),
            course_name: lead.course_name.clone(),
            created_at: lead.created_at,
        }
    }
}

/// What the notification slot is showing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotificationEnvelope {
    Reminder(ReminderEnvelope),
    Lead(LeadEnvelope),
}

impl NotificationEnvelope {
    pub fn kind(&self) -> EntityKind {
        match self {
            NotificationEnvelope::Reminder(_) => EntityKind::Reminder,
            NotificationEnvelope::Lead(_) => EntityKind::Lead,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            NotificationEnvelope::Reminder(r) => &r.session_id,
            NotificationEnvelope::Lead(l) => &l.session_id,
        }
    }

    /// One-line summary for logs and plain-text front-ends.
    pub fn summary(&self) -> String {
        match self {
            NotificationEnvelope::Reminder(r) => {
                format!("{} - {}: {}", r.title, r.subject_name, r.note)
            }
            NotificationEnvelope::Lead(l) => match &l.course_name {
                Some(course) => format!("New lead: {} ({}) for {}", l.applicant_name, l.phone, course),
                None => format!("New lead: {} ({})", l.applicant_name, l.phone),
            },
        }
    }
}

impl From<ReminderEnvelope> for NotificationEnvelope {
    fn from(env: ReminderEnvelope) -> Self {
        NotificationEnvelope::Reminder(env)
    }
}

impl From<LeadEnvelope> for NotificationEnvelope {
    fn from(env: LeadEnvelope) -> Self {
        NotificationEnvelope::Lead(env)
    }
}
