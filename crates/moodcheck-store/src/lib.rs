//! moodcheck Store
//!
//! Local persistent storage for degraded mode:
//! - [`KeyValueStore`] backends (in-memory and file-per-key)
//! - [`LocalStore`] holding the `users` and `responses` collections
//! - Clock-derived local id synthesis

#![warn(unreachable_pub)]

pub mod error;
pub mod ids;
pub mod kv;
pub mod local;

pub use error::StoreError;
pub use ids::LocalIdGenerator;
pub use kv::{FileKv, KeyValueStore, MemoryKv};
pub use local::{LocalStore, CORRUPT_SUFFIX, RESPONSES_KEY, USERS_KEY};
