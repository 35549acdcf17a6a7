//! moodcheck Gateway
//!
//! Decides, per call, whether survey data goes to the remote server or to
//! local storage:
//! - [`SurveyBackend`] strategy trait with remote and local implementations
//! - [`RemoteStore`] HTTP client with per-operation deadlines
//! - [`PersistenceGateway`] facade that falls back on any remote failure
//!
//! # Example
//!
//! ```rust,ignore
//! use moodcheck_core::{ProfileDraft, Score, SurveyConfig};
//! use moodcheck_gateway::PersistenceGateway;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = PersistenceGateway::from_config(&SurveyConfig::new())?;
//!
//! let profile = gateway
//!     .create_profile(ProfileDraft::new("Mia", "🐱", "3", "girl"))
//!     .await;
//! gateway.submit_response_detached(profile.id, 1, Score::new(4)?);
//!
//! let report = gateway.fetch_all_responses().await;
//! println!("{} rows from {}", report.data.len(), report.source);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod backend;
pub mod error;
pub mod gateway;
pub mod remote;

pub use backend::{LocalBackend, SurveyBackend};
pub use error::{BackendError, RemoteError};
pub use gateway::PersistenceGateway;
pub use remote::RemoteStore;
