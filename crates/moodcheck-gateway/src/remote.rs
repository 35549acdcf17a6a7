//! Remote survey API client
//!
//! Talks to the survey server's REST contract:
//! - `POST /api/login` creates a profile
//! - `POST /api/response` stores one answer
//! - `GET /api/admin/responses` returns joined rows, newest first
//!
//! Every call runs under its own deadline. When it expires the request
//! future is dropped, which aborts the in-flight connection.

use crate::backend::SurveyBackend;
use crate::error::{BackendError, RemoteError};
use moodcheck_core::{
    JoinedReportRow, ProfileDraft, RemoteTimeouts, ResponseSubmission, SubmitAck, SurveyConfig,
    UserProfile,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// HTTP implementation of [`SurveyBackend`]
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    timeouts: RemoteTimeouts,
}

impl RemoteStore {
    /// Create client for `base_url` (e.g. `http://127.0.0.1:3000`)
    ///
    /// # Errors
    /// Returns [`RemoteError::ClientSetup`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: RemoteTimeouts) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("moodcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    /// Create client from configuration
    ///
    /// # Errors
    /// Returns [`RemoteError::ClientSetup`] if the HTTP client cannot be built.
    pub fn from_config(config: &SurveyConfig) -> Result<Self, RemoteError> {
        Self::new(config.api_base_url.clone(), config.timeouts)
    }

    /// Server base URL
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait::async_trait]
impl SurveyBackend for RemoteStore {
    async fn create_profile(&self, draft: &ProfileDraft) -> Result<UserProfile, BackendError> {
        const OP: &str = "create_profile";
        let request = self.client.post(self.url("/api/login")).json(draft);
        let profile: UserProfile =
            bounded(OP, self.timeouts.create_profile(), exchange(OP, request)).await?;
        Ok(profile)
    }

    async fn submit_response(
        &self,
        submission: ResponseSubmission,
    ) -> Result<SubmitAck, BackendError> {
        const OP: &str = "submit_response";
        let request = self.client.post(self.url("/api/response")).json(&submission);
        let ack: SubmitAck =
            bounded(OP, self.timeouts.submit_response(), exchange(OP, request)).await?;
        Ok(ack)
    }

    async fn fetch_report(&self) -> Result<Vec<JoinedReportRow>, BackendError> {
        const OP: &str = "fetch_report";
        let request = self.client.get(self.url("/api/admin/responses"));
        let rows: Vec<JoinedReportRow> =
            bounded(OP, self.timeouts.fetch_report(), exchange(OP, request)).await?;
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Race `call` against `limit`; expiry drops the call
async fn bounded<T, F>(operation: &'static str, limit: Duration, call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout {
            operation,
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Send, require 2xx, decode the JSON body
async fn exchange<T: DeserializeOwned>(
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, RemoteError> {
    let response = request
        .send()
        .await
        .map_err(|source| RemoteError::Transport { operation, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Rejected {
            operation,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| RemoteError::Transport { operation, source })?;
    serde_json::from_slice(&body).map_err(|e| RemoteError::Decode {
        operation,
        message: e.to_string(),
    })
}
