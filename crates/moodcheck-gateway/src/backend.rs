//! Survey backend strategy
//!
//! Both execution strategies (remote HTTP and local storage) implement
//! [`SurveyBackend`]; the gateway picks between them per call.

use crate::error::BackendError;
use moodcheck_core::{JoinedReportRow, ProfileDraft, ResponseSubmission, SubmitAck, UserProfile};
use moodcheck_store::{LocalStore, StoreError};
use std::sync::Arc;

/// One way of executing the three survey operations
#[async_trait::async_trait]
pub trait SurveyBackend: Send + Sync + std::fmt::Debug {
    /// Create a profile and return it with its assigned id
    async fn create_profile(&self, draft: &ProfileDraft) -> Result<UserProfile, BackendError>;

    /// Store one answer
    async fn submit_response(
        &self,
        submission: ResponseSubmission,
    ) -> Result<SubmitAck, BackendError>;

    /// All answers joined with their profiles, newest first
    async fn fetch_report(&self) -> Result<Vec<JoinedReportRow>, BackendError>;

    /// Backend name, attached to fallback log lines
    fn name(&self) -> &'static str;
}

/// Degraded-mode strategy: synthesize server fields and persist locally
///
/// Store operations block on file I/O, so each one runs on tokio's
/// blocking pool instead of the async worker that awaits it.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    store: Arc<LocalStore>,
}

impl LocalBackend {
    /// Wrap a shared local store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&LocalStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || op(store.as_ref())).await??)
    }
}

#[async_trait::async_trait]
impl SurveyBackend for LocalBackend {
    async fn create_profile(&self, draft: &ProfileDraft) -> Result<UserProfile, BackendError> {
        let draft = draft.clone();
        self.run(move |store| store.create_profile(draft)).await
    }

    async fn submit_response(
        &self,
        submission: ResponseSubmission,
    ) -> Result<SubmitAck, BackendError> {
        let record = self
            .run(move |store| store.record_response(submission))
            .await?;
        Ok(SubmitAck::local(record.id))
    }

    async fn fetch_report(&self) -> Result<Vec<JoinedReportRow>, BackendError> {
        self.run(LocalStore::assemble_report).await
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodcheck_core::{AckStatus, Score};

    #[tokio::test]
    async fn local_backend_normalizes_ack() {
        let store = Arc::new(LocalStore::in_memory());
        let backend = LocalBackend::new(Arc::clone(&store));

        let profile = backend
            .create_profile(&ProfileDraft::new("Ivy", "🐙", "K", "girl"))
            .await
            .unwrap();
        let ack = backend
            .submit_response(ResponseSubmission {
                user_id: profile.id,
                question_id: 4,
                score: Score::new(5).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(ack.status, AckStatus::SavedLocal);
        assert_eq!(store.responses().unwrap()[0].id, ack.id);

        let rows = backend.fetch_report().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_name, "Ivy");
        assert_eq!(backend.name(), "local");
    }
}
