//! Error types for the persistence gateway
//!
//! Every variant here is absorbed by [`crate::PersistenceGateway`]; callers
//! of the gateway never see them. They exist so the fallback path can log
//! what went wrong and so backends can be tested on their own.

use moodcheck_store::StoreError;

/// Remote call failures
///
/// Unreachable, timed out and rejected are distinct for logging only; the
/// gateway reacts to all of them the same way.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Connection, DNS or protocol failure
    #[error("{operation}: transport error: {source}")]
    Transport {
        /// Operation that failed
        operation: &'static str,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Deadline expired; the request was dropped
    #[error("{operation}: timed out after {timeout_ms}ms")]
    Timeout {
        /// Operation that failed
        operation: &'static str,
        /// Deadline that expired
        timeout_ms: u64,
    },

    /// Server answered with a non-2xx status
    #[error("{operation}: rejected with status {status}")]
    Rejected {
        /// Operation that failed
        operation: &'static str,
        /// HTTP status code
        status: u16,
    },

    /// 2xx response whose body does not match the contract
    #[error("{operation}: malformed response: {message}")]
    Decode {
        /// Operation that failed
        operation: &'static str,
        /// Decoder message
        message: String,
    },

    /// HTTP client could not be constructed
    #[error("client setup failed: {0}")]
    ClientSetup(String),
}

impl RemoteError {
    /// Check if this was a deadline expiry
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if the server answered but refused the request
    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Failure of any [`crate::SurveyBackend`]
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Remote backend failed
    #[error("remote backend: {0}")]
    Remote(#[from] RemoteError),

    /// Local backend failed
    #[error("local backend: {0}")]
    Local(#[from] StoreError),

    /// Blocking local task panicked or was cancelled
    #[error("local backend task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
