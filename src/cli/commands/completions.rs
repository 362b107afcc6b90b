//! Completions command implementation.
//!
//! The `svnmig completions <shell>` command prints a completion script.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::args::{Cli, CompletionsArgs};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The completions command implementation.
pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    /// Create a new completions command.
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }

    /// Write the completion script to `out`.
    pub fn write_to(&self, out: &mut dyn Write) {
        generate(self.args.shell, &mut Cli::command(), "svnmig", out);
    }
}

impl Command for CompletionsCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut stdout = std::io::stdout();
        self.write_to(&mut stdout);
        stdout.flush()?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;

    #[test]
    fn bash_script_mentions_subcommands() {
        let cmd = CompletionsCommand::new(CompletionsArgs { shell: Shell::Bash });
        let mut out = Vec::new();
        cmd.write_to(&mut out);
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("svnmig"));
        assert!(script.contains("authors"));
        assert!(script.contains("verify"));
    }

    #[test]
    fn zsh_script_is_generated() {
        let cmd = CompletionsCommand::new(CompletionsArgs { shell: Shell::Zsh });
        let mut out = Vec::new();
        cmd.write_to(&mut out);
        assert!(String::from_utf8(out).unwrap().contains("#compdef svnmig"));
    }
}
