//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations and hands every long-running
//! command the same cancellation token.

pub mod authors;
pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod verify;

pub use authors::AuthorsCommand;
pub use completions::CompletionsCommand;
pub use config::ConfigCommand;
pub use dispatcher::{Command, CommandDispatcher, CommandResult, EXIT_INTERRUPTED};
pub use verify::VerifyCommand;
