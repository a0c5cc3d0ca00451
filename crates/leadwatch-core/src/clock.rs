//! Wall-clock abstraction.
//!
//! Reminders match against *local* wall time while the lead cursor moves in
//! UTC instants, so the clock exposes both views of "now".

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, Offset, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current local wall time (calendar date + time of day).
    fn local_now(&self) -> NaiveDateTime;

    /// UTC offset of the local zone `local_now` is expressed in.
    fn local_offset(&self) -> FixedOffset;
}

/// The host clock, local time taken from the system timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn local_offset(&self) -> FixedOffset {
        *Local::now().offset()
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Clock at `now`, with local time equal to UTC.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    /// Clock at `now`, with local time shifted by `offset`.
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Mutex::new(now),
            offset,
        }
    }

    /// Clock whose local wall time is `local` (UTC offset zero).
    pub fn at_local(local: NaiveDateTime) -> Self {
        Self::new(local.and_utc())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn set_local(&self, local: NaiveDateTime) {
        let utc = local - self.offset_duration();
        self.set(utc.and_utc());
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    fn offset_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.offset.local_minus_utc()))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn local_now(&self) -> NaiveDateTime {
        self.now().with_timezone(&self.offset).naive_local()
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset
    }
}
