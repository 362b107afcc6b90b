//! Probe outcome types.
//!
//! Every launched probe produces exactly one `ProbeOutcome`. Failures carry
//! enough context to print a single line telling the user what to fix.

use std::fmt;

use super::version::Version;

/// Why a probe did not pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeFailure {
    /// The command could not be found on PATH.
    #[error("Sorry, {name} is not installed (could not run '{command}')")]
    MissingBinary { name: String, command: String },

    /// Installed but older than required.
    #[error(
        "Sorry, the installed version for {name} ({installed}) is less than the required version {required}"
    )]
    VersionTooLow {
        name: String,
        installed: Version,
        required: Version,
    },

    /// Ran, but printed nothing that looks like a version.
    #[error("Could not determine the installed version of {name} from {output:?}")]
    VersionUnreadable { name: String, output: String },

    /// Ran and exited non-zero.
    #[error("Running '{command}' for {name} failed{}", describe_exit(.code, .stderr))]
    CommandFailed {
        name: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// None of the connectivity targets answered.
    #[error("Unable to connect to the internet. Please check your connectivity")]
    NetworkUnreachable { targets: Vec<String> },

    /// No outcome before the deadline.
    #[error("{name} did not finish within {secs}s")]
    TimedOut { name: String, secs: u64 },

    /// Verification was interrupted first.
    #[error("{name} was interrupted")]
    Cancelled { name: String },

    /// The probe body panicked before reporting.
    #[error("{name} check crashed unexpectedly")]
    Panicked { name: String },
}

fn describe_exit(code: &Option<i32>, stderr: &str) -> String {
    let mut out = match code {
        Some(code) => format!(" with exit code {}", code),
        None => " (terminated by signal)".to_string(),
    };
    if let Some(line) = stderr.lines().find(|l| !l.trim().is_empty()) {
        out.push_str(": ");
        out.push_str(line.trim());
    }
    out
}

/// The result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Requirement met; `detail` is shown in verbose output.
    Passed { detail: String },
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn passed(detail: impl Into<String>) -> Self {
        ProbeOutcome::Passed {
            detail: detail.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, ProbeOutcome::Passed { .. })
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            ProbeOutcome::Passed { .. } => None,
            ProbeOutcome::Failed(failure) => Some(failure),
        }
    }
}

impl From<ProbeFailure> for ProbeOutcome {
    fn from(failure: ProbeFailure) -> Self {
        ProbeOutcome::Failed(failure)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Passed { detail } => f.write_str(detail),
            ProbeOutcome::Failed(failure) => write!(f, "{}", failure),
        }
    }
}

/// A probe's name paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The probe that was run
    pub name: String,
    /// What happened
    pub outcome: ProbeOutcome,
}
