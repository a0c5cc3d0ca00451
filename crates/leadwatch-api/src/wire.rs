//! Wire format of the admin API and its conversion into domain types.
//!
//! Rows are decoded one at a time so a single malformed row is dropped
//! instead of failing the whole batch.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use leadwatch_core::types::{LeadItem, LeadStatus, ReminderItem};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// List responses come either bare or wrapped with a total.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListPayload {
    Wrapped {
        data: Vec<Value>,
        #[serde(default)]
        total: Option<u64>,
    },
    Bare(Vec<Value>),
}

impl ListPayload {
    pub fn into_parts(self) -> (Vec<Value>, Option<u64>) {
        match self {
            ListPayload::Wrapped { data, total } => (data, total),
            ListPayload::Bare(rows) => (rows, None),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Text(String),
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Num(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lead: Option<LinkedLead>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedLead {
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ReminderRow {
    /// `None` when the date or time is missing or unparseable. Timestamped
    /// dates are read in the `local` zone.
    pub fn into_item(self, local: FixedOffset) -> Option<ReminderItem> {
        let scheduled_time = parse_time(self.time.as_deref()?)?;
        let scheduled_date = parse_date(self.date.as_deref()?, local)?;
        let (linked_name, linked_phone) = match self.lead {
            Some(lead) => (lead.full_name, lead.phone),
            None => (None, None),
        };
        Some(ReminderItem {
            id: self.id,
            scheduled_time,
            scheduled_date,
            linked_name,
            contact_name: self.name,
            note: self.note.unwrap_or_default(),
            phone: self.phone.or(linked_phone),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRow {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "fullName")]
    pub applicant_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub course: Option<CourseRef>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CourseRef {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<LeadRow> for LeadItem {
    fn from(row: LeadRow) -> Self {
        let course_name = row
            .course_name
            .or_else(|| row.course.and_then(|c| c.name));
        LeadItem {
            id: row.id,
            created_at: row.created_at,
            applicant_name: row.applicant_name,
            phone: row.phone.unwrap_or_default(),
            course_name,
            // the feed is filtered to pending server-side
            status: row.status.map(LeadStatus::from).unwrap_or(LeadStatus::Pending),
        }
    }
}

/// Normalize `H:MM`, `HH:MM` or `HH:MM:SS` to zero-padded `HH:MM`.
pub fn parse_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
        .map(|t| t.format("%H:%M").to_string())
}

/// Calendar date from `YYYY-MM-DD` (optionally followed by a time part), or
/// the date an RFC 3339 timestamp falls on at offset `local`.
pub fn parse_date(raw: &str, local: FixedOffset) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&local).date_naive());
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// Decode rows individually, dropping the ones that don't fit `T`.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, what: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!("🗑️ Dropping malformed {what} row: {e}");
                None
            }
        })
        .collect()
}

pub fn reminders_from_rows(rows: Vec<Value>, local: FixedOffset) -> Vec<ReminderItem> {
    decode_rows::<ReminderRow>(rows, "reminder")
        .into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            let item = row.into_item(local);
            if item.is_none() {
                tracing::debug!("🗑️ Dropping reminder {id}: missing or invalid date/time");
            }
            item
        })
        .collect()
}

pub fn leads_from_rows(rows: Vec<Value>) -> Vec<LeadItem> {
    decode_rows::<LeadRow>(rows, "lead")
        .into_iter()
        .map(LeadItem::from)
        .collect()
}
