//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// svnmig - Subversion to Git migration assistant.
#[derive(Debug, Parser)]
#[command(name = "svnmig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, arg_required_else_help = true)]
pub struct Cli {
    /// Path to config file (overrides .svnmig/config.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a git-svn authors file from the repository log
    Authors(AuthorsArgs),

    /// Check that migration prerequisites are installed
    Verify(VerifyArgs),

    /// Show resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `authors` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct AuthorsArgs {
    /// Authors file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Email domain for generated addresses
    #[arg(long)]
    pub domain: Option<String>,

    /// Repository working copy to read the log from
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Command that prints the revision log
    #[arg(long)]
    pub log_command: Option<String>,

    /// Overwrite an existing authors file without asking
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `verify` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VerifyArgs {
    /// Overall time limit in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip the network reachability check
    #[arg(long)]
    pub skip_network: bool,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
