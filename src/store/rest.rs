//! PostgREST report store
//!
//! HTTP client for the hosted backend's REST surface:
//!
//! - `GET  /rest/v1/{table}?select=*&order=created_at.desc`
//! - `PATCH /rest/v1/{table}?id=eq.{id}` with `{"resolved": true}`
//!
//! Change notification goes through the realtime WebSocket, see
//! [`RealtimeListener`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::realtime::{RealtimeConfig, RealtimeListener};
use super::{ReportStore, StoreError, StoreResult, Subscription};
use crate::report::{Report, ReportId};

/// Connection settings for the REST surface
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project base URL (e.g., "https://abc.supabase.co")
    pub url: String,
    /// Anon or service key, sent as `apikey` and bearer token
    pub api_key: String,
    /// Table holding the reports
    pub table: String,
    /// Optional per-request timeout; none by default
    pub request_timeout: Option<Duration>,
}

impl RestStoreConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: "reports".to_string(),
            request_timeout: None,
        }
    }

    /// Collection endpoint for the report table
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }
}

/// Report store backed by a PostgREST endpoint
pub struct RestStore {
    client: Client,
    config: RestStoreConfig,
    realtime: RealtimeConfig,
}

impl RestStore {
    /// Build a store; fails if the URL or key is missing or the HTTP client
    /// cannot be constructed
    pub fn new(config: RestStoreConfig, realtime: RealtimeConfig) -> StoreResult<Self> {
        if config.url.trim().is_empty() {
            return Err(StoreError::Config("backend url is empty".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(StoreError::Config("backend api key is empty".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            realtime,
        })
    }

    pub fn config(&self) -> &RestStoreConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.config.api_key.as_str())
            .bearer_auth(&self.config.api_key)
    }

    fn list_url(&self) -> String {
        format!("{}?select=*&order=created_at.desc", self.config.table_url())
    }

    fn update_url(&self, id: &ReportId) -> String {
        format!(
            "{}?id=eq.{}",
            self.config.table_url(),
            urlencoding::encode(&id.to_string())
        )
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Api {
                status,
                message: api_error_message(&body),
            })
        }
    }
}

#[async_trait]
impl ReportStore for RestStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    async fn list_reports(&self) -> StoreResult<Vec<Report>> {
        let response = self.send(self.client.get(self.list_url())).await?;
        let body = response.text().await.map_err(classify_transport_error)?;
        let reports: Vec<Report> = serde_json::from_str(&body)?;

        tracing::debug!(count = reports.len(), table = %self.config.table, "Fetched reports");
        Ok(reports)
    }

    async fn mark_resolved(&self, id: &ReportId) -> StoreResult<()> {
        let request = self
            .client
            .patch(self.update_url(id))
            .header("Prefer", "return=minimal")
            .json(&ResolvedPatch { resolved: true });

        self.send(request).await?;
        tracing::info!(report_id = %id, "Report marked resolved");
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        RealtimeListener::new(self.realtime.clone()).connect().await
    }
}

#[derive(Debug, Serialize)]
struct ResolvedPatch {
    resolved: bool,
}

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Human-readable message from an error body, falling back to the raw text
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(PostgrestError {
            message: Some(message),
            hint,
        }) => match hint {
            Some(hint) if !hint.is_empty() => format!("{} ({})", message, hint),
            _ => message,
        },
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

fn classify_transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connect() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Request(e)
    }
}
