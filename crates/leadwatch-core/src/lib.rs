//! # Leadwatch Core
//!
//! Shared building blocks for the Leadwatch notifier:
//! - domain types (reminders, leads, notification envelopes, session ids)
//! - the wall-clock abstraction used for minute matching and feed cursors
//! - the error type every crate returns
//! - collaborator traits (admin API, API connector, alert sound)
//! - TOML configuration

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LeadwatchConfig;
pub use error::{LeadwatchError, Result};
pub use traits::{AdminApi, AlertSound, ApiConnector, SilentAlert};
pub use types::{
    EntityKind, LeadEnvelope, LeadItem, LeadStatus, NotificationEnvelope, ReminderEnvelope,
    ReminderItem, SessionId,
};
