//! Command handlers for the CLI application.
//!
//! - `serve`: the daemon itself
//! - `client`: bus-client commands (send, close, dismiss, action, info) and
//!   the snapshot-file reader (list)

pub mod client;
pub mod serve;

/// Result type for command handlers
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
