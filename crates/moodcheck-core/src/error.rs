//! Error types for moodcheck core
//!
//! Covers caller-side input validation and configuration loading.
//! Remote and storage failures live next to the code that raises them
//! (`moodcheck-gateway` and `moodcheck-store`).

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// Likert score outside `1..=5`
    #[error("invalid score {0}: expected a value between 1 and 5")]
    InvalidScore(i64),

    /// Profile draft rejected before submission
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl SurveyError {
    /// Check if error came from user input (as opposed to the environment)
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidScore(_) | Self::InvalidProfile(_))
    }
}
