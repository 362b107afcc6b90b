//! Configuration validation rules.
//!
//! All problems are collected rather than stopping at the first one, so
//! they can be fixed in one pass.

use crate::config::schema::SvnmigConfig;
use crate::error::{Result, SvnmigError};
use crate::requirements::Version;
use crate::shell::CommandSpec;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Dotted path of the offending field
    pub field: String,
}

impl ValidationError {
    fn new(rule: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            field: field.into(),
        }
    }
}

/// Validate a configuration and return all errors.
pub fn validate_config(config: &SvnmigConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_authors(config));
    errors.extend(validate_verify(config));

    errors
}

fn validate_authors(config: &SvnmigConfig) -> Vec<ValidationError> {
    let authors = &config.authors;
    let mut errors = Vec::new();

    if authors.domain.trim().is_empty() {
        errors.push(ValidationError::new(
            "empty-domain",
            "authors.domain",
            "authors.domain must not be empty",
        ));
    }
    if CommandSpec::parse(&authors.log_command).is_none() {
        errors.push(ValidationError::new(
            "empty-log-command",
            "authors.log_command",
            "authors.log_command must not be empty",
        ));
    }
    if authors.output.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "empty-output",
            "authors.output",
            "authors.output must not be empty",
        ));
    }

    errors
}

fn validate_verify(config: &SvnmigConfig) -> Vec<ValidationError> {
    let verify = &config.verify;
    let mut errors = Vec::new();

    if verify.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "zero-timeout",
            "verify.timeout_secs",
            "verify.timeout_secs must be greater than zero",
        ));
    }

    for (i, dep) in verify.dependencies.iter().enumerate() {
        let field = format!("verify.dependencies[{}]", i);
        if dep.name.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-dependency-name",
                format!("{}.name", field),
                format!("Dependency #{} has no name", i + 1),
            ));
        }
        if CommandSpec::parse(&dep.command).is_none() {
            errors.push(ValidationError::new(
                "empty-dependency-command",
                format!("{}.command", field),
                format!("Dependency '{}' has an empty command", dep.name),
            ));
        }
        if Version::parse(&dep.required_version).is_none() {
            errors.push(ValidationError::new(
                "invalid-version",
                format!("{}.required_version", field),
                format!(
                    "Dependency '{}' has an invalid required_version '{}'",
                    dep.name, dep.required_version
                ),
            ));
        }
    }

    let connectivity = &verify.connectivity;
    if connectivity.enabled {
        if connectivity.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "zero-timeout",
                "verify.connectivity.timeout_secs",
                "verify.connectivity.timeout_secs must be greater than zero",
            ));
        }
        if connectivity.targets.is_empty() {
            errors.push(ValidationError::new(
                "no-connectivity-targets",
                "verify.connectivity.targets",
                "verify.connectivity is enabled but has no targets",
            ));
        }
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &SvnmigConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(SvnmigError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DependencyConfig;

    fn rules(config: &SvnmigConfig) -> Vec<String> {
        validate_config(config).into_iter().map(|e| e.rule).collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&SvnmigConfig::default()).is_ok());
    }

    #[test]
    fn rejects_empty_domain_and_log_command() {
        let mut config = SvnmigConfig::default();
        config.authors.domain = " ".to_string();
        config.authors.log_command = String::new();

        let found = rules(&config);
        assert!(found.contains(&"empty-domain".to_string()));
        assert!(found.contains(&"empty-log-command".to_string()));
    }

    #[test]
    fn rejects_bad_dependencies() {
        let mut config = SvnmigConfig::default();
        config.verify.dependencies = vec![
            DependencyConfig::new("", "1.0", "tool"),
            DependencyConfig::new("svn", "1..2", "svn"),
            DependencyConfig::new("git", "1.7", " "),
        ];

        let errors = validate_config(&config);
        let found: Vec<_> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(
            found,
            vec![
                "empty-dependency-name",
                "invalid-version",
                "empty-dependency-command"
            ]
        );
        assert_eq!(errors[1].field, "verify.dependencies[1].required_version");
    }

    #[test]
    fn rejects_zero_timeouts() {
        let mut config = SvnmigConfig::default();
        config.verify.timeout_secs = 0;
        config.verify.connectivity.timeout_secs = 0;

        let errors = validate_config(&config);
        assert_eq!(errors.iter().filter(|e| e.rule == "zero-timeout").count(), 2);
    }

    #[test]
    fn disabled_connectivity_is_not_checked() {
        let mut config = SvnmigConfig::default();
        config.verify.connectivity.enabled = false;
        config.verify.connectivity.targets.clear();
        config.verify.connectivity.timeout_secs = 0;

        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn validate_joins_all_messages() {
        let mut config = SvnmigConfig::default();
        config.authors.domain.clear();
        config.verify.timeout_secs = 0;

        match validate(&config) {
            Err(SvnmigError::ConfigValidationError { message }) => {
                assert!(message.contains("authors.domain"));
                assert!(message.contains("verify.timeout_secs"));
            }
            other => panic!("expected ConfigValidationError, got {other:?}"),
        }
    }
}
