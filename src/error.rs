//! Error types for svnmig operations.
//!
//! This module defines [`SvnmigError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Pipeline-fatal conditions (launch, read, process exit, sink) abort an
//!   extraction run and surface as `SvnmigError`
//! - Malformed log lines and failed probes are recoverable and never become
//!   an `SvnmigError`; they are counted or aggregated by their callers
//! - Use `anyhow::Error` (via `SvnmigError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for svnmig operations.
#[derive(Debug, Error)]
pub enum SvnmigError {
    /// External process could not be started.
    #[error("Failed to launch '{command}': {source}")]
    LaunchError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Output stream of an external process could not be opened or read.
    #[error("Failed to read output of '{command}': {message}")]
    ReadError { command: String, message: String },

    /// External process exited with a non-zero status.
    #[error("Command '{command}' {}{}", describe_exit(.code), format_stderr(.stderr))]
    ProcessError {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Output sink could not be created or written.
    #[error("Cannot write authors file {path}: {source}")]
    SinkError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was interrupted before it could finish.
    #[error("Interrupted")]
    Cancelled,

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Result type alias for svnmig operations.
pub type Result<T> = std::result::Result<T, SvnmigError>;
