//! In-process fakes shared by the unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use leadwatch_core::error::{LeadwatchError, Result};
use leadwatch_core::traits::{AdminApi, AlertSound};
use leadwatch_core::types::{LeadItem, LeadStatus, ReminderItem};

/// Reference instant for feed tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap()
}

pub fn lead(id: &str, secs_after_t0: i64) -> LeadItem {
    LeadItem {
        id: id.to_string(),
        created_at: t0() + Duration::seconds(secs_after_t0),
        applicant_name: format!("Applicant {id}"),
        phone: "0901000000".into(),
        course_name: Some("IELTS".into()),
        status: LeadStatus::Pending,
    }
}

pub fn reminder(id: &str, date: NaiveDate, time: &str) -> ReminderItem {
    ReminderItem {
        id: id.to_string(),
        scheduled_time: time.to_string(),
        scheduled_date: date,
        linked_name: Some(format!("Contact {id}")),
        contact_name: None,
        note: "follow up".into(),
        phone: None,
    }
}

#[derive(Default)]
pub struct CountingSound(AtomicUsize);

impl CountingSound {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl AlertSound for CountingSound {
    fn play(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripted admin API. Each list is returned as-is (no server-side
/// filtering); `fail` makes every call a transport error and
/// `unauthorized` a 401.
#[derive(Default)]
pub struct FakeApi {
    pub reminders: Mutex<Vec<ReminderItem>>,
    pub leads: Mutex<Vec<LeadItem>>,
    pub pending_count: Mutex<u64>,
    pub fail: Mutex<bool>,
    pub unauthorized: Mutex<bool>,
    pub reminder_calls: AtomicUsize,
    pub lead_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    pub last_after: Mutex<Option<DateTime<Utc>>>,
}

impl FakeApi {
    pub fn set_leads(&self, leads: Vec<LeadItem>) {
        *self.leads.lock().unwrap() = leads;
    }

    pub fn set_reminders(&self, reminders: Vec<ReminderItem>) {
        *self.reminders.lock().unwrap() = reminders;
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Answer every call with 401 until cleared.
    pub fn set_unauthorized(&self, unauthorized: bool) {
        *self.unauthorized.lock().unwrap() = unauthorized;
    }

    pub fn lead_calls(&self) -> usize {
        self.lead_calls.load(Ordering::SeqCst)
    }

    fn check_fail(&self) -> Result<()> {
        if *self.unauthorized.lock().unwrap() {
            Err(LeadwatchError::Api {
                status: 401,
                body: "token expired".into(),
            })
        } else if *self.fail.lock().unwrap() {
            Err(LeadwatchError::Http("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AdminApi for FakeApi {
    async fn fetch_reminders(&self, limit: usize) -> Result<Vec<ReminderItem>> {
        self.reminder_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        Ok(self.reminders.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn fetch_leads_since(&self, after: DateTime<Utc>, limit: usize) -> Result<Vec<LeadItem>> {
        self.lead_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_after.lock().unwrap() = Some(after);
        self.check_fail()?;
        Ok(self.leads.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn count_pending_leads(&self, limit: usize) -> Result<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        Ok((*self.pending_count.lock().unwrap()).min(limit as u64))
    }
}
