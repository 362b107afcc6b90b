//! svnmig - Subversion to Git migration assistant.
//!
//! svnmig prepares a Subversion repository for `git svn clone`: it writes
//! the authors file git-svn needs and checks that the tools the migration
//! depends on are installed.
//!
//! # Modules
//!
//! - [`authors`] - Streaming author extraction and the authors file
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`requirements`] - Concurrent prerequisite verification
//! - [`shell`] - Process execution, streaming, and cancellation
//! - [`ui`] - Prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use svnmig::requirements::Version;
//!
//! let installed: Version = "1.10.0".parse().unwrap();
//! let required: Version = "1.7.7.5".parse().unwrap();
//! assert!(installed.satisfies(&required));
//! ```

pub mod authors;
pub mod cli;
pub mod config;
pub mod error;
pub mod requirements;
pub mod shell;
pub mod ui;

pub use error::{Result, SvnmigError};
