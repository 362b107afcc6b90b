//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::shell::CancelToken;
use crate::ui::UserInterface;

use super::authors::AuthorsCommand;
use super::completions::CompletionsCommand;
use super::config::ConfigCommand;
use super::verify::VerifyCommand;

/// Exit code for a run stopped by Ctrl-C or SIGTERM.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result for a run stopped by the user.
    pub fn interrupted() -> Self {
        Self::failure(EXIT_INTERRUPTED)
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    cancel: CancelToken,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            config_override: None,
            cancel: CancelToken::new(),
        }
    }

    /// Load configuration from this file instead of discovering it.
    pub fn with_config_override(mut self, path: Option<PathBuf>) -> Self {
        self.config_override = path;
        self
    }

    /// Token that interrupts long-running commands.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.config_override.as_deref();
        match &cli.command {
            Commands::Authors(args) => AuthorsCommand::new(&self.project_root, args.clone())
                .with_config_override(config)
                .with_cancel(self.cancel.clone())
                .execute(ui),
            Commands::Verify(args) => VerifyCommand::new(&self.project_root, args.clone())
                .with_config_override(config)
                .with_cancel(self.cancel.clone())
                .execute(ui),
            Commands::Config(args) => ConfigCommand::new(&self.project_root, args.clone())
                .with_config_override(config)
                .execute(ui),
            Commands::Completions(args) => CompletionsCommand::new(args.clone()).execute(ui),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn command_result_codes() {
        assert_eq!(CommandResult::success().exit_code, 0);
        assert!(CommandResult::success().success);
        assert_eq!(CommandResult::failure(3).exit_code, 3);
        assert!(!CommandResult::failure(3).success);
        assert_eq!(CommandResult::interrupted().exit_code, 130);
    }

    #[test]
    fn dispatches_config_command() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("custom.yml");
        fs::write(&config, "authors:\n  domain: dispatch.test\n").unwrap();

        let cli = Cli::parse_from(["svnmig", "config"]);
        let dispatcher = CommandDispatcher::new(temp.path().to_path_buf())
            .with_config_override(Some(config));
        let mut ui = MockUI::new();

        let result = dispatcher.dispatch(&cli, &mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_message("dispatch.test"));
    }

    #[test]
    fn project_root_is_kept() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("/srv/project"));
        assert_eq!(dispatcher.project_root(), Path::new("/srv/project"));
    }
}
