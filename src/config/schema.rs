//! Configuration schema definitions for svnmig.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format. Every field has a default, so an empty or
//! missing file yields a usable configuration.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SvnmigError};
use crate::requirements::{Dependency, Version};
use crate::shell::CommandSpec;

/// Root configuration structure for `.svnmig/config.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvnmigConfig {
    /// Authors file extraction
    pub authors: AuthorsConfig,

    /// Prerequisite verification
    pub verify: VerifyConfig,
}

/// Settings for `svnmig authors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorsConfig {
    /// Authors file to write
    pub output: PathBuf,

    /// Email domain for generated addresses
    pub domain: String,

    /// Repository working copy the log command runs in
    pub repo: PathBuf,

    /// Command that prints the revision log
    pub log_command: String,
}

impl Default for AuthorsConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("authors.txt"),
            domain: "foo.com".to_string(),
            repo: PathBuf::from("/home/svn/"),
            log_command: "svn log --quiet".to_string(),
        }
    }
}

impl AuthorsConfig {
    /// The log command as a program plus arguments.
    pub fn log_command_spec(&self) -> Result<CommandSpec> {
        CommandSpec::parse(&self.log_command).ok_or_else(|| SvnmigError::ConfigValidationError {
            message: "authors.log_command must not be empty".to_string(),
        })
    }
}

/// Settings for `svnmig verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Overall deadline for all probes, in seconds
    pub timeout_secs: u64,

    /// Tools that must be installed
    pub dependencies: Vec<DependencyConfig>,

    /// Network reachability check
    pub connectivity: ConnectivityConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            dependencies: vec![
                DependencyConfig::new("Git", "1.7.7.5", "git"),
                DependencyConfig::new("svn", "1.6.17", "svn"),
                DependencyConfig::new("git-svn", "1.7.7.5", "git svn"),
            ],
            connectivity: ConnectivityConfig::default(),
        }
    }
}

impl VerifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A required tool.
///
/// Quote versions with a single dot (`"1.10"`); YAML reads them as
/// floating point numbers otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Display name
    pub name: String,

    /// Minimum acceptable version
    #[serde(deserialize_with = "string_or_number")]
    pub required_version: String,

    /// Invocation to which `--version` is appended
    pub command: String,
}

impl DependencyConfig {
    pub fn new(name: &str, required_version: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            required_version: required_version.to_string(),
            command: command.to_string(),
        }
    }

    /// Build the runtime dependency.
    pub fn to_dependency(&self) -> Result<Dependency> {
        let invalid = |message: String| SvnmigError::ConfigValidationError { message };
        let required = Version::parse(&self.required_version).ok_or_else(|| {
            invalid(format!(
                "Dependency '{}' has an invalid required_version '{}'",
                self.name, self.required_version
            ))
        })?;
        let command = CommandSpec::parse(&self.command).ok_or_else(|| {
            invalid(format!("Dependency '{}' has an empty command", self.name))
        })?;
        Ok(Dependency::new(&self.name, required, command))
    }
}

/// TCP reachability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub enabled: bool,

    /// `host:port` targets; any one answering is enough
    pub targets: Vec<String>,

    /// Per-connection timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            targets: vec!["google.com:80".to_string()],
            timeout_secs: 5,
        }
    }
}

impl ConnectivityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, found {:?}",
            other
        ))),
    }
}
