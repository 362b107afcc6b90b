//! Individual dependency probes.
//!
//! A probe checks one thing (a tool's version, network reachability) and
//! always produces an outcome rather than an error. Probes run on their own
//! threads, so they must be `Send + Sync`, and they must stop promptly when
//! the cancel token they are handed is raised.

use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::SvnmigError;
use crate::shell::{execute, CancelToken, CommandOptions, CommandSpec};

use super::status::{ProbeFailure, ProbeOutcome};
use super::version::{extract_version, Version};

/// Default flag appended to a dependency's command.
pub const VERSION_ARG: &str = "--version";

/// One check run by the dependency checker.
pub trait Probe: Send + Sync {
    /// Name shown in the report.
    fn name(&self) -> &str;

    /// Run the check. Must return promptly once `cancel` is raised.
    fn run(&self, cancel: &CancelToken) -> ProbeOutcome;
}

/// A tool that must be installed at or above a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub required_version: Version,
    pub command: CommandSpec,
    pub version_arg: String,
}

impl Dependency {
    pub fn new(name: &str, required_version: Version, command: CommandSpec) -> Self {
        Self {
            name: name.to_string(),
            required_version,
            command,
            version_arg: VERSION_ARG.to_string(),
        }
    }

    /// The full version query, e.g. `git svn --version`.
    pub fn version_command(&self) -> CommandSpec {
        self.command.clone().arg(&self.version_arg)
    }
}

/// Runs a dependency's version query and compares the result.
#[derive(Debug, Clone)]
pub struct ToolProbe {
    dependency: Dependency,
    timeout: Option<Duration>,
}

impl ToolProbe {
    pub fn new(dependency: Dependency) -> Self {
        Self {
            dependency,
            timeout: None,
        }
    }

    /// Kill the version query if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    fn evaluate(&self, stdout: &str) -> ProbeOutcome {
        let dep = &self.dependency;
        let Some(installed) = extract_version(stdout) else {
            return ProbeFailure::VersionUnreadable {
                name: dep.name.clone(),
                output: stdout.lines().next().unwrap_or("").to_string(),
            }
            .into();
        };

        if installed.satisfies(&dep.required_version) {
            ProbeOutcome::passed(format!(
                "{} {} (requires {})",
                dep.name, installed, dep.required_version
            ))
        } else {
            ProbeFailure::VersionTooLow {
                name: dep.name.clone(),
                installed,
                required: dep.required_version.clone(),
            }
            .into()
        }
    }
}

impl Probe for ToolProbe {
    fn name(&self) -> &str {
        &self.dependency.name
    }

    fn run(&self, cancel: &CancelToken) -> ProbeOutcome {
        let dep = &self.dependency;
        let spec = dep.version_command();
        let options = CommandOptions {
            timeout: self.timeout,
            ..Default::default()
        };

        let result = match execute(&spec, &options, cancel) {
            Ok(result) => result,
            Err(SvnmigError::LaunchError { source, .. }) if source.kind() == ErrorKind::NotFound => {
                return ProbeFailure::MissingBinary {
                    name: dep.name.clone(),
                    command: spec.to_string(),
                }
                .into();
            }
            Err(SvnmigError::Cancelled) => {
                return ProbeFailure::Cancelled {
                    name: dep.name.clone(),
                }
                .into();
            }
            Err(e) => {
                return ProbeFailure::CommandFailed {
                    name: dep.name.clone(),
                    command: spec.to_string(),
                    code: None,
                    stderr: e.to_string(),
                }
                .into();
            }
        };

        if result.timed_out {
            return ProbeFailure::TimedOut {
                name: dep.name.clone(),
                secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            }
            .into();
        }
        if !result.success {
            return ProbeFailure::CommandFailed {
                name: dep.name.clone(),
                command: spec.to_string(),
                code: result.exit_code,
                stderr: result.stderr,
            }
            .into();
        }

        self.evaluate(result.first_line())
    }
}

/// Passes if any target accepts a TCP connection.
#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    targets: Vec<String>,
    timeout: Duration,
}

impl ConnectivityProbe {
    pub const NAME: &'static str = "network";

    /// `targets` are `host:port` strings.
    pub fn new(targets: Vec<String>, timeout: Duration) -> Self {
        Self { targets, timeout }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    fn reachable(&self, target: &str, cancel: &CancelToken) -> bool {
        let addrs = match target.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!("Could not resolve {}: {}", target, e);
                return false;
            }
        };
        for addr in addrs {
            if cancel.is_cancelled() {
                return false;
            }
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(_) => return true,
                Err(e) => tracing::debug!("Connecting to {} ({}) failed: {}", target, addr, e),
            }
        }
        false
    }
}

impl Probe for ConnectivityProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, cancel: &CancelToken) -> ProbeOutcome {
        for target in &self.targets {
            if cancel.is_cancelled() {
                return ProbeFailure::Cancelled {
                    name: Self::NAME.to_string(),
                }
                .into();
            }
            if self.reachable(target, cancel) {
                return ProbeOutcome::passed(format!("reached {}", target));
            }
        }
        ProbeFailure::NetworkUnreachable {
            targets: self.targets.clone(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn dep(name: &str, required: &str, command: CommandSpec) -> Dependency {
        Dependency::new(name, Version::parse(required).unwrap(), command)
    }

    #[test]
    fn version_command_appends_flag() {
        let d = dep("git-svn", "1.7.7.5", CommandSpec::parse("git svn").unwrap());
        assert_eq!(d.version_command().to_string(), "git svn --version");
    }

    #[test]
    fn missing_binary() {
        let probe = ToolProbe::new(dep(
            "nope",
            "1.0",
            CommandSpec::new("definitely-not-installed-4242"),
        ));
        let outcome = probe.run(&CancelToken::new());
        assert!(matches!(
            outcome,
            ProbeOutcome::Failed(ProbeFailure::MissingBinary { .. })
        ));
    }

    #[test]
    fn evaluate_compares_numerically() {
        let probe = ToolProbe::new(dep("Git", "1.7.7.5", CommandSpec::new("git")));
        assert!(probe.evaluate("git version 1.10.0.0").is_passed());
    }

    #[test]
    fn evaluate_too_low() {
        let probe = ToolProbe::new(dep("svn", "1.6.17", CommandSpec::new("svn")));
        let outcome = probe.evaluate("svn, version 1.6.9 (r901367)");
        match outcome {
            ProbeOutcome::Failed(ProbeFailure::VersionTooLow { installed, .. }) => {
                assert_eq!(installed.to_string(), "1.6.9");
            }
            other => panic!("expected VersionTooLow, got {other:?}"),
        }
    }

    #[test]
    fn evaluate_unreadable() {
        let probe = ToolProbe::new(dep("svn", "1.6.17", CommandSpec::new("svn")));
        assert!(matches!(
            probe.evaluate("usage: svn <subcommand>"),
            ProbeOutcome::Failed(ProbeFailure::VersionUnreadable { .. })
        ));
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        // `sh -c SCRIPT --version` runs SCRIPT with $0 set to "--version".
        fn sh(script: &str) -> CommandSpec {
            CommandSpec::new("sh").arg("-c").arg(script)
        }

        #[test]
        fn passes_when_new_enough() {
            let probe = ToolProbe::new(dep("Git", "1.7.7.5", sh("echo git version 2.39.2")));
            let outcome = probe.run(&CancelToken::new());
            assert_eq!(
                outcome,
                ProbeOutcome::passed("Git 2.39.2 (requires 1.7.7.5)")
            );
        }

        #[test]
        fn non_zero_exit_is_command_failed() {
            let probe = ToolProbe::new(dep(
                "git-svn",
                "1.7.7.5",
                sh("echo \"git: 'svn' is not a git command.\" >&2; exit 1"),
            ));
            match probe.run(&CancelToken::new()) {
                ProbeOutcome::Failed(ProbeFailure::CommandFailed { code, stderr, .. }) => {
                    assert_eq!(code, Some(1));
                    assert!(stderr.contains("not a git command"));
                }
                other => panic!("expected CommandFailed, got {other:?}"),
            }
        }

        #[test]
        fn slow_tool_times_out() {
            let probe = ToolProbe::new(dep("svn", "1.6.17", sh("exec sleep 10")))
                .with_timeout(Duration::from_millis(100));
            assert!(matches!(
                probe.run(&CancelToken::new()),
                ProbeOutcome::Failed(ProbeFailure::TimedOut { .. })
            ));
        }

        #[test]
        fn cancelled_tool_reports_cancelled() {
            let cancel = CancelToken::new();
            cancel.cancel();
            let probe = ToolProbe::new(dep("svn", "1.6.17", sh("exec sleep 10")));
            assert!(matches!(
                probe.run(&cancel),
                ProbeOutcome::Failed(ProbeFailure::Cancelled { .. })
            ));
        }
    }

    // Bind then drop to get a port with no listener.
    fn closed_port() -> String {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        format!("127.0.0.1:{}", port)
    }

    #[test]
    fn connectivity_passes_if_any_target_answers() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let target = listener.local_addr().unwrap().to_string();
        let probe = ConnectivityProbe::new(
            vec![closed_port(), "not a target".to_string(), target],
            Duration::from_secs(1),
        );
        assert!(probe.run(&CancelToken::new()).is_passed());
    }

    #[test]
    fn connectivity_fails_when_nothing_answers() {
        let probe = ConnectivityProbe::new(vec![closed_port()], Duration::from_millis(200));
        assert!(matches!(
            probe.run(&CancelToken::new()),
            ProbeOutcome::Failed(ProbeFailure::NetworkUnreachable { .. })
        ));
    }

    #[test]
    fn connectivity_without_targets_fails() {
        let probe = ConnectivityProbe::new(Vec::new(), Duration::from_millis(10));
        assert!(!probe.run(&CancelToken::new()).is_passed());
    }
}
