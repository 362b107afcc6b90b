//! Command-line interface for svnmig.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{AuthorsArgs, Cli, Commands, CompletionsArgs, ConfigArgs, VerifyArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
