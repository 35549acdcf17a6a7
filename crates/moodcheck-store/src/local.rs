//! Local survey store
//!
//! Holds the two collections used in degraded mode, each a JSON array under
//! a fixed key, read-modify-written wholesale on every mutation.
//!
//! A single lock serializes every read-modify-write cycle, so writers in the
//! same process never lose updates and never observe a half-cleared store.
//! Separate processes sharing one directory can still race.

use crate::error::StoreError;
use crate::ids::LocalIdGenerator;
use crate::kv::{FileKv, KeyValueStore, MemoryKv};
use chrono::{SecondsFormat, Utc};
use moodcheck_core::report;
use moodcheck_core::{JoinedReportRow, ProfileDraft, ResponseRecord, ResponseSubmission, UserProfile};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Key of the profile collection
pub const USERS_KEY: &str = "moodcheck.users";

/// Key of the response collection
pub const RESPONSES_KEY: &str = "moodcheck.responses";

/// Suffix of the key a corrupt collection is copied to before being reset
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Local fallback store for profiles and responses
#[derive(Debug)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
    ids: LocalIdGenerator,
}

impl LocalStore {
    /// Create store over any backend
    #[inline]
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            lock: Mutex::new(()),
            ids: LocalIdGenerator::new(),
        }
    }

    /// Create store backed by process memory
    #[inline]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKv::new()))
    }

    /// Open a file-backed store under `dir`
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileKv::open(dir)?)))
    }

    /// All stored profiles, oldest first
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read.
    pub fn users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let _guard = self.lock.lock();
        self.load(USERS_KEY)
    }

    /// All stored responses, oldest first
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read.
    pub fn responses(&self) -> Result<Vec<ResponseRecord>, StoreError> {
        let _guard = self.lock.lock();
        self.load(RESPONSES_KEY)
    }

    /// Append a profile as-is
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read or written.
    pub fn append_user(&self, profile: UserProfile) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut users: Vec<UserProfile> = self.load(USERS_KEY)?;
        users.push(profile);
        self.save(USERS_KEY, &users)
    }

    /// Append a response as-is
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read or written.
    pub fn append_response(&self, record: ResponseRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut responses: Vec<ResponseRecord> = self.load(RESPONSES_KEY)?;
        responses.push(record);
        self.save(RESPONSES_KEY, &responses)
    }

    /// Create a profile with a locally synthesized id and persist it
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read or written.
    pub fn create_profile(&self, draft: ProfileDraft) -> Result<UserProfile, StoreError> {
        let _guard = self.lock.lock();
        let mut users: Vec<UserProfile> = self.load(USERS_KEY)?;
        if let Some(max) = users.iter().map(|u| u.id).max() {
            self.ids.observe(max);
        }

        let profile = draft.into_profile(self.ids.next_id());
        users.push(profile.clone());
        self.save(USERS_KEY, &users)?;

        tracing::debug!(user_id = profile.id, "Stored profile locally");
        Ok(profile)
    }

    /// Record an answer with a local id and the current time, and persist it
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read or written.
    pub fn record_response(
        &self,
        submission: ResponseSubmission,
    ) -> Result<ResponseRecord, StoreError> {
        let _guard = self.lock.lock();
        let mut responses: Vec<ResponseRecord> = self.load(RESPONSES_KEY)?;
        if let Some(max) = responses.iter().map(|r| r.id).max() {
            self.ids.observe(max);
        }

        let record = ResponseRecord {
            id: self.ids.next_id(),
            user_id: submission.user_id,
            question_id: submission.question_id,
            score: i64::from(submission.score),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        responses.push(record.clone());
        self.save(RESPONSES_KEY, &responses)?;

        tracing::debug!(
            response_id = record.id,
            user_id = record.user_id,
            question_id = record.question_id,
            "Stored response locally"
        );
        Ok(record)
    }

    /// Join both collections into report rows, newest first
    ///
    /// Both collections are read under one lock acquisition.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read.
    pub fn assemble_report(&self) -> Result<Vec<JoinedReportRow>, StoreError> {
        let (users, responses) = {
            let _guard = self.lock.lock();
            let users: Vec<UserProfile> = self.load(USERS_KEY)?;
            let responses: Vec<ResponseRecord> = self.load(RESPONSES_KEY)?;
            (users, responses)
        };
        Ok(report::assemble(&users, &responses))
    }

    /// Remove both collections
    ///
    /// Both removals are attempted even if the first fails, so one failing
    /// key never leaves the other collection behind. Clearing an empty store
    /// succeeds. Quarantined corrupt copies are kept.
    ///
    /// # Errors
    /// Returns the first [`StoreError`] hit while removing.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let responses = self.kv.remove(RESPONSES_KEY);
        let users = self.kv.remove(USERS_KEY);
        responses.and(users)?;
        tracing::info!("Cleared local survey data");
        Ok(())
    }

    /// Read a collection; caller holds the lock
    ///
    /// Unparseable content is copied to `<key>.corrupt` and the collection
    /// is treated as empty, so the next write starts a fresh array.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(key, error = %e, "Local collection is corrupt, treating as empty");
                let quarantine = format!("{key}{CORRUPT_SUFFIX}");
                if let Err(e) = self.kv.set(&quarantine, &raw) {
                    tracing::error!(key = %quarantine, error = %e, "Failed to quarantine corrupt collection");
                }
                Ok(Vec::new())
            }
        }
    }

    /// Write a collection; caller holds the lock
    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(items)?;
        self.kv.set(key, &encoded)
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodcheck_core::Score;
    use pretty_assertions::assert_eq;

    fn draft(name: &str) -> ProfileDraft {
        ProfileDraft::new(name, "🐼", "1", "boy")
    }

    fn submission(user_id: i64, question_id: i64, score: i64) -> ResponseSubmission {
        ResponseSubmission {
            user_id,
            question_id,
            score: Score::new(score).unwrap(),
        }
    }

    #[test]
    fn created_profile_is_readable() {
        let store = LocalStore::in_memory();
        let profile = store.create_profile(draft("Ana")).unwrap();

        assert!(profile.id > 0);
        assert_eq!(store.users().unwrap(), vec![profile]);
    }

    #[test]
    fn rapid_creates_get_distinct_ids() {
        let store = LocalStore::in_memory();
        let ids: Vec<i64> = (0..50)
            .map(|i| store.create_profile(draft(&format!("kid{i}"))).unwrap().id)
            .collect();

        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn recorded_response_matches_inputs() {
        let store = LocalStore::in_memory();
        let record = store.record_response(submission(7, 3, 4)).unwrap();

        assert_eq!(record.user_id, 7);
        assert_eq!(record.question_id, 3);
        assert_eq!(record.score, 4);
        assert!(report::parse_timestamp(&record.timestamp).is_some());
        assert_eq!(store.responses().unwrap(), vec![record]);
    }

    #[test]
    fn ids_continue_after_existing_data() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(
            USERS_KEY,
            r#"[{"id":9999999999999,"name":"Old","avatar":"🐸","grade":"2","gender":"girl"}]"#,
        )
        .unwrap();

        let store = LocalStore::new(kv);
        let profile = store.create_profile(draft("New")).unwrap();
        assert_eq!(profile.id, 10_000_000_000_000);
    }

    #[test]
    fn corrupt_collection_is_quarantined() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(RESPONSES_KEY, "{not json").unwrap();

        let store = LocalStore::new(kv.clone());
        assert!(store.responses().unwrap().is_empty());
        assert_eq!(
            kv.get(&format!("{RESPONSES_KEY}{CORRUPT_SUFFIX}")).unwrap().as_deref(),
            Some("{not json")
        );

        store.record_response(submission(1, 1, 2)).unwrap();
        assert_eq!(store.responses().unwrap().len(), 1);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = LocalStore::in_memory();
        store.create_profile(draft("Ana")).unwrap();
        store.record_response(submission(1, 1, 5)).unwrap();

        store.clear().unwrap();
        assert!(store.users().unwrap().is_empty());
        assert!(store.responses().unwrap().is_empty());

        store.clear().unwrap();
        assert!(store.users().unwrap().is_empty());
        assert!(store.assemble_report().unwrap().is_empty());
    }

    #[test]
    fn report_joins_local_collections() {
        let store = LocalStore::in_memory();
        let profile = store.create_profile(draft("Ana")).unwrap();
        store.record_response(submission(profile.id, 1, 5)).unwrap();
        store.record_response(submission(424_242, 2, 1)).unwrap();

        let rows = store.assemble_report().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.user_name == "Ana"));
        assert!(rows.iter().any(|r| r.is_orphan()));
    }

    /// Backend that refuses to delete the response collection
    #[derive(Debug, Default)]
    struct StuckResponses {
        inner: MemoryKv,
    }

    impl KeyValueStore for StuckResponses {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            if key == RESPONSES_KEY {
                return Err(StoreError::InvalidKey(key.to_string()));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_clear_still_removes_users() {
        let store = LocalStore::new(Arc::new(StuckResponses::default()));
        store.create_profile(draft("Ana")).unwrap();
        store.record_response(submission(1, 1, 2)).unwrap();

        assert!(store.clear().is_err());
        assert!(store.users().unwrap().is_empty());
    }
}
