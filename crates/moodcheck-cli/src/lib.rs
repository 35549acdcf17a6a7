//! moodcheck CLI
//!
//! Command-line front end over [`moodcheck_gateway::PersistenceGateway`]:
//! create profiles, submit answers, print the admin report and wipe
//! offline data.

#![warn(unreachable_pub)]

pub mod cli;
pub mod logging;
pub mod run;

pub use cli::{build_command, resolve, resolve_with, Action, Invocation};
pub use logging::init_tracing;
pub use run::execute;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
