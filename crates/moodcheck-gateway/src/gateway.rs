//! Persistence Gateway
//!
//! The single entry point the survey front end talks to. Each operation:
//! 1. Tries the remote backend under its deadline
//! 2. On any failure (unreachable, timeout, non-2xx, bad body) runs the
//!    same operation against the local store
//! 3. Returns a usable value either way
//!
//! Nothing here returns an error to the caller. Failures are logged and
//! absorbed; degraded mode is visible only through [`SubmitAck::status`]
//! and [`ReportSnapshot::source`].

use crate::backend::{LocalBackend, SurveyBackend};
use crate::error::{BackendError, RemoteError};
use crate::remote::RemoteStore;
use moodcheck_core::{
    ProfileDraft, ReportSnapshot, ResponseSubmission, Score, SubmitAck, SurveyConfig, UserProfile,
};
use moodcheck_store::LocalStore;
use std::sync::Arc;

/// Remote-first facade with local fallback
///
/// Cheap to clone; clones share both backends.
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    /// Primary strategy
    remote: Arc<dyn SurveyBackend>,
    /// Fallback strategy (the same store as `local`)
    fallback: Arc<dyn SurveyBackend>,
    /// Local store, for operations with no remote counterpart
    local: Arc<LocalStore>,
}

impl PersistenceGateway {
    /// Create gateway over an explicit remote backend and local store
    #[inline]
    #[must_use]
    pub fn new(remote: Arc<dyn SurveyBackend>, local: Arc<LocalStore>) -> Self {
        Self {
            remote,
            fallback: Arc::new(LocalBackend::new(Arc::clone(&local))),
            local,
        }
    }

    /// Create gateway from configuration: HTTP remote, file-backed local store
    ///
    /// # Errors
    /// Returns [`BackendError`] if the HTTP client cannot be built or the
    /// data directory cannot be created.
    pub fn from_config(config: &SurveyConfig) -> Result<Self, BackendError> {
        let remote = RemoteStore::from_config(config)?;
        let local = LocalStore::open(config.data_dir.clone())?;
        tracing::debug!(
            api = %remote.base_url(),
            data_dir = %config.data_dir.display(),
            "Gateway configured"
        );
        Ok(Self::new(Arc::new(remote), Arc::new(local)))
    }

    /// Local store used in degraded mode
    #[inline]
    #[must_use]
    pub fn local_store(&self) -> &Arc<LocalStore> {
        &self.local
    }

    /// Create a child's profile
    ///
    /// The caller validates the draft (see [`ProfileDraft::validate`]).
    ///
    /// # Returns
    /// The server's profile verbatim, or a locally created one whose id is
    /// derived from the current epoch millisecond.
    pub async fn create_profile(&self, draft: ProfileDraft) -> UserProfile {
        match self.remote.create_profile(&draft).await {
            Ok(profile) => {
                tracing::info!(user_id = profile.id, "Profile created remotely");
                return profile;
            }
            Err(e) => log_fallback(self.remote.name(), "create_profile", &e),
        }

        match self.fallback.create_profile(&draft).await {
            Ok(profile) => {
                tracing::info!(user_id = profile.id, "Profile created locally");
                profile
            }
            Err(e) => {
                let profile = draft.into_profile(chrono::Utc::now().timestamp_millis());
                tracing::error!(
                    user_id = profile.id,
                    error = %e,
                    "Local store unavailable, profile is not persisted"
                );
                profile
            }
        }
    }

    /// Store one answer and wait for the outcome
    ///
    /// # Returns
    /// The server's acknowledgement, or `{ id, status: "saved_local" }`
    /// when the answer was written locally.
    pub async fn submit_response(
        &self,
        user_id: i64,
        question_id: i64,
        score: Score,
    ) -> SubmitAck {
        let submission = ResponseSubmission {
            user_id,
            question_id,
            score,
        };

        match self.remote.submit_response(submission).await {
            Ok(ack) => {
                tracing::debug!(response_id = ack.id, user_id, question_id, "Answer saved remotely");
                return ack;
            }
            Err(e) => log_fallback(self.remote.name(), "submit_response", &e),
        }

        match self.fallback.submit_response(submission).await {
            Ok(ack) => {
                tracing::debug!(response_id = ack.id, user_id, question_id, "Answer saved locally");
                ack
            }
            Err(e) => {
                let ack = SubmitAck::local(chrono::Utc::now().timestamp_millis());
                tracing::error!(
                    user_id,
                    question_id,
                    error = %e,
                    "Local store unavailable, answer is lost"
                );
                ack
            }
        }
    }

    /// Store one answer in the background
    ///
    /// Spawns [`Self::submit_response`] on the current tokio runtime and
    /// returns immediately; the task handle is discarded. Callers must not
    /// assume the answer is stored when this returns. The outcome is only
    /// visible in the logs.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn submit_response_detached(&self, user_id: i64, question_id: i64, score: Score) {
        let gateway = self.clone();
        let _detached = tokio::spawn(async move {
            let ack = gateway.submit_response(user_id, question_id, score).await;
            tracing::trace!(
                response_id = ack.id,
                status = ack.status.as_str(),
                "Background submission settled"
            );
        });
    }

    /// Fetch every answer for the admin report
    ///
    /// # Returns
    /// Server rows tagged `DB`, or rows assembled from local storage tagged
    /// `LOCAL`. An unreadable local store yields an empty `LOCAL` report.
    pub async fn fetch_all_responses(&self) -> ReportSnapshot {
        match self.remote.fetch_report().await {
            Ok(rows) => {
                tracing::info!(rows = rows.len(), "Report fetched from server");
                return ReportSnapshot::remote(rows);
            }
            Err(e) => log_fallback(self.remote.name(), "fetch_all_responses", &e),
        }

        match self.fallback.fetch_report().await {
            Ok(rows) => {
                tracing::info!(rows = rows.len(), "Report assembled from local storage");
                ReportSnapshot::local(rows)
            }
            Err(e) => {
                tracing::error!(error = %e, "Local store unavailable, report is empty");
                ReportSnapshot::local(Vec::new())
            }
        }
    }

    /// Wipe both local collections
    ///
    /// Has no remote effect. Clearing an already empty store is a no-op.
    pub fn clear_local_data(&self) {
        if let Err(e) = self.local.clear() {
            tracing::error!(error = %e, "Failed to clear local survey data");
        }
    }
}

fn log_fallback(backend: &'static str, operation: &'static str, error: &BackendError) {
    match error {
        BackendError::Remote(RemoteError::Timeout { timeout_ms, .. }) => {
            tracing::warn!(
                backend,
                operation,
                timeout_ms,
                "Remote call timed out, using local store"
            );
        }
        _ => {
            tracing::warn!(
                backend,
                operation,
                error = %error,
                "Remote call failed, using local store"
            );
        }
    }
}
