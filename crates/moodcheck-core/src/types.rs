//! Core types for moodcheck
//!
//! Defines the survey data model shared by every crate:
//! - Profiles and the draft a child fills in before an id exists
//! - Likert scores and stored responses
//! - Joined report rows and the source-tagged report snapshot
//!
//! Field names match the remote HTTP contract exactly, so every type here
//! is also its own wire format.

use crate::error::SurveyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `user_id` used in report rows whose profile could not be found
pub const UNKNOWN_USER_ID: i64 = -1;

/// Display name used in report rows whose profile could not be found
pub const UNKNOWN_USER_NAME: &str = "Unknown";

/// Avatar glyph used in report rows whose profile could not be found
pub const DEFAULT_AVATAR: &str = "👤";

/// A child's profile, as returned by the server or synthesized locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-assigned id, or an epoch-millisecond id when created offline
    pub id: i64,
    /// Display name
    pub name: String,
    /// Emoji glyph
    pub avatar: String,
    /// Grade label
    pub grade: String,
    /// Gender label
    pub gender: String,
}

/// Profile fields submitted before an id is assigned
///
/// This is also the body of `POST /api/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    /// Display name (must not be blank)
    pub name: String,
    /// Emoji glyph
    pub avatar: String,
    /// Grade label
    pub grade: String,
    /// Gender label
    pub gender: String,
}

impl ProfileDraft {
    /// Create new draft
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        avatar: impl Into<String>,
        grade: impl Into<String>,
        gender: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
            grade: grade.into(),
            gender: gender.into(),
        }
    }

    /// Caller-side validation. The gateway never calls this itself.
    ///
    /// # Errors
    /// Returns [`SurveyError::InvalidProfile`] when the name is blank.
    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.name.trim().is_empty() {
            return Err(SurveyError::InvalidProfile("name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Attach an id, producing the stored profile
    #[inline]
    #[must_use]
    pub fn into_profile(self, id: i64) -> UserProfile {
        UserProfile {
            id,
            name: self.name,
            avatar: self.avatar,
            grade: self.grade,
            gender: self.gender,
        }
    }
}

/// A 1–5 Likert answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    /// Lowest accepted value
    pub const MIN: u8 = 1;
    /// Highest accepted value
    pub const MAX: u8 = 5;

    /// Create a score, rejecting values outside `1..=5`
    ///
    /// # Errors
    /// Returns [`SurveyError::InvalidScore`] for out-of-range values.
    pub fn new(value: i64) -> Result<Self, SurveyError> {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(SurveyError::InvalidScore(value)),
        }
    }

    /// Get numeric value
    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = SurveyError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        i64::from(score.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /api/response`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSubmission {
    /// Answering profile
    pub user_id: i64,
    /// Question answered
    pub question_id: i64,
    /// Likert answer
    pub score: Score,
}

/// A stored answer to one question
///
/// `score` stays a plain integer here so a single bad value in persisted
/// data cannot make the whole collection unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Record id
    pub id: i64,
    /// Foreign key to [`UserProfile::id`] (not enforced)
    pub user_id: i64,
    /// Question answered
    pub question_id: i64,
    /// Likert answer
    pub score: i64,
    /// ISO-8601 time the answer was recorded
    pub timestamp: String,
}

/// Where an acknowledged answer ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// Accepted by the server
    Saved,
    /// Written to local storage after the server was unavailable
    SavedLocal,
}

impl AckStatus {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::SavedLocal => "saved_local",
        }
    }
}

/// Acknowledgement of a submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    /// Record id (server-assigned or local)
    pub id: i64,
    /// Save location
    pub status: AckStatus,
}

impl SubmitAck {
    /// Acknowledgement for a locally stored answer
    #[inline]
    #[must_use]
    pub fn local(id: i64) -> Self {
        Self {
            id,
            status: AckStatus::SavedLocal,
        }
    }

    /// Check if the answer was only stored locally
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.status == AckStatus::SavedLocal
    }
}

/// One response denormalized with its profile's display fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedReportRow {
    /// Profile id, or [`UNKNOWN_USER_ID`]
    pub user_id: i64,
    /// Profile name, or [`UNKNOWN_USER_NAME`]
    pub user_name: String,
    /// Profile avatar, or [`DEFAULT_AVATAR`]
    pub user_avatar: String,
    /// Profile grade (blank when unknown)
    pub user_grade: String,
    /// Profile gender (blank when unknown)
    pub user_gender: String,
    /// Question answered
    pub question_id: i64,
    /// Likert answer
    pub score: i64,
    /// ISO-8601 time the answer was recorded
    pub timestamp: String,
}

impl JoinedReportRow {
    /// Project a response through its (possibly missing) profile
    #[must_use]
    pub fn project(record: &ResponseRecord, profile: Option<&UserProfile>) -> Self {
        match profile {
            Some(user) => Self {
                user_id: user.id,
                user_name: user.name.clone(),
                user_avatar: user.avatar.clone(),
                user_grade: user.grade.clone(),
                user_gender: user.gender.clone(),
                question_id: record.question_id,
                score: record.score,
                timestamp: record.timestamp.clone(),
            },
            None => Self {
                user_id: UNKNOWN_USER_ID,
                user_name: UNKNOWN_USER_NAME.to_string(),
                user_avatar: DEFAULT_AVATAR.to_string(),
                user_grade: String::new(),
                user_gender: String::new(),
                question_id: record.question_id,
                score: record.score,
                timestamp: record.timestamp.clone(),
            },
        }
    }

    /// Check if this row was built from a dangling reference
    #[inline]
    #[must_use]
    pub fn is_orphan(&self) -> bool {
        self.user_id == UNKNOWN_USER_ID
    }
}

/// Which side produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    /// Remote database
    #[serde(rename = "DB")]
    Remote,
    /// Local storage (degraded mode)
    #[serde(rename = "LOCAL")]
    Local,
}

impl DataSource {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "DB",
            Self::Local => "LOCAL",
        }
    }

    /// Check if this is degraded mode
    #[inline]
    #[must_use]
    pub fn is_degraded(self) -> bool {
        self == Self::Local
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report rows tagged with their source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    /// Which side produced `data`
    pub source: DataSource,
    /// Rows, newest first
    pub data: Vec<JoinedReportRow>,
}

impl ReportSnapshot {
    /// Snapshot of server rows
    #[inline]
    #[must_use]
    pub fn remote(data: Vec<JoinedReportRow>) -> Self {
        Self {
            source: DataSource::Remote,
            data,
        }
    }

    /// Snapshot assembled from local storage
    #[inline]
    #[must_use]
    pub fn local(data: Vec<JoinedReportRow>) -> Self {
        Self {
            source: DataSource::Local,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn score_bounds() {
        assert!(Score::new(1).is_ok());
        assert!(Score::new(5).is_ok());
        assert!(matches!(Score::new(0), Err(SurveyError::InvalidScore(0))));
        assert!(matches!(Score::new(6), Err(SurveyError::InvalidScore(6))));
        assert!(matches!(Score::new(-3), Err(SurveyError::InvalidScore(-3))));
        assert!(Score::new(i64::from(u8::MAX) + 1).is_err());
    }

    #[test]
    fn score_serializes_as_integer() {
        let submission = ResponseSubmission {
            user_id: 7,
            question_id: 2,
            score: Score::new(4).unwrap(),
        };
        let json = serde_json::to_value(submission).unwrap();
        assert_eq!(json, serde_json::json!({"user_id": 7, "question_id": 2, "score": 4}));

        let bad: Result<ResponseSubmission, _> =
            serde_json::from_value(serde_json::json!({"user_id": 7, "question_id": 2, "score": 9}));
        assert!(bad.is_err());
    }

    #[test]
    fn draft_validation() {
        assert!(ProfileDraft::new("Mia", "🐱", "3", "girl").validate().is_ok());
        assert!(ProfileDraft::new("   ", "🐱", "3", "girl").validate().is_err());
        assert!(ProfileDraft::new("", "🐱", "3", "girl").validate().is_err());
    }

    #[test]
    fn ack_status_wire_names() {
        let json = serde_json::to_string(&SubmitAck::local(12)).unwrap();
        assert_eq!(json, r#"{"id":12,"status":"saved_local"}"#);

        let ack: SubmitAck = serde_json::from_str(r#"{"id":3,"status":"saved"}"#).unwrap();
        assert_eq!(ack.status, AckStatus::Saved);
        assert!(!ack.is_local());
    }

    #[test]
    fn data_source_wire_names() {
        let snapshot = ReportSnapshot::local(Vec::new());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["source"], "LOCAL");
        assert_eq!(DataSource::Remote.to_string(), "DB");
        assert!(DataSource::Local.is_degraded());
    }

    #[test]
    fn project_orphan_uses_placeholders() {
        let record = ResponseRecord {
            id: 1,
            user_id: 999,
            question_id: 5,
            score: 3,
            timestamp: "2024-03-01T10:00:00Z".to_string(),
        };
        let row = JoinedReportRow::project(&record, None);
        assert_eq!(row.user_id, UNKNOWN_USER_ID);
        assert_eq!(row.user_name, UNKNOWN_USER_NAME);
        assert_eq!(row.user_avatar, DEFAULT_AVATAR);
        assert_eq!(row.user_grade, "");
        assert!(row.is_orphan());
    }
}
