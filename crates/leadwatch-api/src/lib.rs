//! # Leadwatch API
//!
//! Read-only HTTP client for the admin dashboard REST API. Implements
//! [`leadwatch_core::AdminApi`] over three endpoints:
//! - `GET /reminders` (reminder window)
//! - `GET /leads?created_after=..` (new-lead feed)
//! - `GET /leads?filterByStatus=PENDING` (badge count)

pub mod client;
pub mod wire;

pub use client::{HttpAdminApi, HttpConnector};
