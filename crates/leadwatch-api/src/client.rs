//! Admin API client over `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use leadwatch_core::clock::{Clock, SystemClock};
use leadwatch_core::config::ApiConfig;
use leadwatch_core::error::{LeadwatchError, Result};
use leadwatch_core::traits::{AdminApi, ApiConnector};
use leadwatch_core::types::{LeadItem, LeadStatus, ReminderItem};
use serde_json::Value;

use crate::wire::{self, ListPayload};

/// Admin API bound to one session token.
pub struct HttpAdminApi {
    /// Base URL without trailing slash (e.g. "https://crm.example.com/api").
    base_url: String,
    /// Bearer token of the current session.
    token: String,
    client: reqwest::Client,
    /// Zone that timestamped reminder dates are read in.
    clock: Arc<dyn Clock>,
}

impl HttpAdminApi {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| LeadwatchError::Config(format!("Invalid API base URL '{base_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LeadwatchError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            token: token.to_string(),
            client,
            clock: Arc::new(SystemClock),
        })
    }

    /// Read reminder dates in `clock`'s local zone instead of the host's.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", self.token))
        }
    }

    async fn get_list(&self, path: &str, query: &[(&str, String)]) -> Result<(Vec<Value>, Option<u64>)> {
        let url = format!("{}/{}", self.base_url, path);
        let req = self
            .client
            .get(&url)
            .query(query)
            .header("Accept", "application/json");

        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| LeadwatchError::Http(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LeadwatchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ListPayload = resp
            .json()
            .await
            .map_err(|e| LeadwatchError::Parse(format!("GET {url}: {e}")))?;
        Ok(payload.into_parts())
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn fetch_reminders(&self, limit: usize) -> Result<Vec<ReminderItem>> {
        let (rows, _) = self
            .get_list(
                "reminders",
                &[
                    ("limit", limit.to_string()),
                    ("sort_by", "time".into()),
                    ("sort_order", "asc".into()),
                ],
            )
            .await?;
        Ok(wire::reminders_from_rows(rows, self.clock.local_offset()))
    }

    async fn fetch_leads_since(&self, after: DateTime<Utc>, limit: usize) -> Result<Vec<LeadItem>> {
        let (rows, _) = self
            .get_list(
                "leads",
                &[
                    ("created_after", after.to_rfc3339_opts(SecondsFormat::Millis, true)),
                    ("sort_by", "createdAt".into()),
                    ("sort_order", "asc".into()),
                    ("filterByStatus", LeadStatus::Pending.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(wire::leads_from_rows(rows))
    }

    async fn count_pending_leads(&self, limit: usize) -> Result<u64> {
        let (rows, total) = self
            .get_list(
                "leads",
                &[
                    ("filterByStatus", LeadStatus::Pending.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        let count = total.unwrap_or(rows.len() as u64);
        Ok(count.min(limit as u64))
    }
}

/// Creates an [`HttpAdminApi`] per session token.
#[derive(Clone)]
pub struct HttpConnector {
    base_url: String,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl HttpConnector {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
            clock: Arc::new(SystemClock),
        }
    }

    /// Share the notifier's clock so reminder dates and "today" agree.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.base_url.clone(), config.timeout())
    }
}

impl ApiConnector for HttpConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn AdminApi>> {
        let api = HttpAdminApi::new(&self.base_url, token, self.timeout)?.with_clock(self.clock.clone());
        Ok(Arc::new(api))
    }
}
