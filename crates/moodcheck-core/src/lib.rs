//! moodcheck Core
//!
//! Shared building blocks for the mood survey persistence layer:
//! - Survey data model (profiles, responses, joined report rows)
//! - Validated caller inputs (profile drafts, Likert scores)
//! - Layered configuration with per-operation remote deadlines
//! - Report assembly for degraded (local-only) mode
//!
//! # Example
//!
//! ```rust
//! use moodcheck_core::{report, ResponseRecord, UserProfile};
//!
//! let users = vec![UserProfile {
//!     id: 1,
//!     name: "A".into(),
//!     avatar: "🐱".into(),
//!     grade: "3".into(),
//!     gender: "girl".into(),
//! }];
//! let responses = vec![ResponseRecord {
//!     id: 10,
//!     user_id: 1,
//!     question_id: 5,
//!     score: 3,
//!     timestamp: "2024-05-01T09:00:00Z".into(),
//! }];
//!
//! let rows = report::assemble(&users, &responses);
//! assert_eq!(rows[0].user_name, "A");
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod error;
pub mod report;
pub mod types;

// Re-exports for convenience
pub use config::{RemoteTimeouts, SurveyConfig};
pub use error::SurveyError;
pub use report::QuestionSummary;
pub use types::{
    AckStatus, DataSource, JoinedReportRow, ProfileDraft, ReportSnapshot, ResponseRecord,
    ResponseSubmission, Score, SubmitAck, UserProfile, DEFAULT_AVATAR, UNKNOWN_USER_ID,
    UNKNOWN_USER_NAME,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with moodcheck Core
    pub use crate::{
        DataSource, JoinedReportRow, ProfileDraft, ReportSnapshot, ResponseRecord, Score,
        SubmitAck, SurveyConfig, UserProfile,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
