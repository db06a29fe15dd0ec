//! Client for the Opus `getEventSessions` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use session_types::{ModifiedTimestamp, RawSessionRecord};
use std::time::Duration;

use crate::config::OpusConfig;
use crate::error::{PollError, PollResult};

/// Anything that can list the event's sessions, optionally only those
/// modified after `cursor`
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn fetch_sessions(
        &self,
        cursor: Option<&ModifiedTimestamp>,
    ) -> PollResult<Vec<RawSessionRecord>>;
}

/// Request body for `getEventSessions`
#[derive(Debug, Serialize)]
pub struct SessionQuery<'a> {
    #[serde(rename = "clientGUID")]
    pub client_guid: &'a str,
    pub event_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    data: Option<SessionData>,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    result: Option<Vec<Value>>,
}

pub struct OpusClient {
    http: Client,
    config: OpusConfig,
}

impl OpusClient {
    pub fn new(config: OpusConfig, timeout: Duration) -> PollResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    /// Build the request body; the filter is only sent when a cursor exists
    /// and incremental fetching is enabled
    pub fn query(&self, cursor: Option<&ModifiedTimestamp>) -> SessionQuery<'_> {
        let filter = cursor
            .filter(|_| self.config.incremental)
            .map(ModifiedTimestamp::filter_expression);

        self.query_with_filter(filter)
    }

    /// Build the request body with an explicit filter, regardless of the
    /// `incremental` setting
    pub fn query_with_filter(&self, filter: Option<String>) -> SessionQuery<'_> {
        SessionQuery {
            client_guid: &self.config.client_guid,
            event_id: &self.config.event_id,
            filter,
        }
    }

    /// Fetch sessions with an explicit filter expression (or none)
    pub async fn fetch_filtered(&self, filter: Option<String>) -> PollResult<Vec<RawSessionRecord>> {
        self.send_query(self.query_with_filter(filter)).await
    }

    async fn send_query(&self, query: SessionQuery<'_>) -> PollResult<Vec<RawSessionRecord>> {
        tracing::debug!(
            "Requesting sessions for event {} (filter: {:?})",
            query.event_id,
            query.filter
        );

        let response: SessionResponse = self
            .http
            .post(&self.config.api_url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        extract_records(response)
    }
}

#[async_trait]
impl SessionSource for OpusClient {
    async fn fetch_sessions(
        &self,
        cursor: Option<&ModifiedTimestamp>,
    ) -> PollResult<Vec<RawSessionRecord>> {
        self.send_query(self.query(cursor)).await
    }
}

fn extract_records(response: SessionResponse) -> PollResult<Vec<RawSessionRecord>> {
    let entries = response
        .data
        .ok_or_else(|| PollError::malformed("missing `data`"))?
        .result
        .ok_or_else(|| PollError::malformed("missing `data.result`"))?;

    Ok(RawSessionRecord::from_values(entries))
}
