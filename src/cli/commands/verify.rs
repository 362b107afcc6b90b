//! Verify command implementation.
//!
//! The `svnmig verify` command checks every prerequisite at once and lists
//! all failures, not just the first.

use std::path::{Path, PathBuf};

use crate::cli::args::VerifyArgs;
use crate::config::{load_config, validate, VerifyConfig};
use crate::error::Result;
use crate::requirements::{ConnectivityProbe, DependencyChecker, ToolProbe};
use crate::shell::CancelToken;
use crate::ui::{OutputMode, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The verify command implementation.
pub struct VerifyCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    cancel: CancelToken,
    args: VerifyArgs,
}

impl VerifyCommand {
    /// Create a new verify command.
    pub fn new(project_root: &Path, args: VerifyArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: None,
            cancel: CancelToken::new(),
            args,
        }
    }

    /// Read only this config file instead of the discovered ones.
    pub fn with_config_override(mut self, path: Option<&Path>) -> Self {
        self.config_override = path.map(Path::to_path_buf);
        self
    }

    /// Token that interrupts verification.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &VerifyArgs {
        &self.args
    }

    fn settings(&self) -> Result<VerifyConfig> {
        let mut config = load_config(&self.project_root, self.config_override.as_deref())?;
        if let Some(secs) = self.args.timeout {
            config.verify.timeout_secs = secs;
        }
        if self.args.skip_network {
            config.verify.connectivity.enabled = false;
        }
        validate(&config)?;
        Ok(config.verify)
    }

    fn checker(&self, settings: &VerifyConfig) -> Result<DependencyChecker> {
        let mut checker = DependencyChecker::default();
        for dependency in &settings.dependencies {
            let probe = ToolProbe::new(dependency.to_dependency()?).with_timeout(settings.timeout());
            checker = checker.with_probe(probe);
        }
        let connectivity = &settings.connectivity;
        if connectivity.enabled {
            checker = checker.with_probe(ConnectivityProbe::new(
                connectivity.targets.clone(),
                connectivity.timeout(),
            ));
        }
        Ok(checker)
    }
}

impl Command for VerifyCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.settings()?;
        let checker = self.checker(&settings)?;

        if checker.is_empty() {
            ui.warning("Nothing to verify");
            return Ok(CommandResult::success());
        }

        // A passing run prints nothing unless progress is transient or asked for.
        let verbose = ui.output_mode() == OutputMode::Verbose;
        let mut spinner = (verbose || ui.is_interactive())
            .then(|| ui.start_spinner(&format!("Checking {} prerequisites", checker.len())));
        let report = checker.run(settings.timeout(), &self.cancel);
        if let Some(spinner) = spinner.as_mut() {
            spinner.finish_clear();
        }

        if verbose {
            ui.show_header("Prerequisites");
        }
        for result in &report.results {
            if result.outcome.is_passed() {
                if verbose {
                    ui.success(&result.outcome.to_string());
                }
            } else {
                ui.error(&result.outcome.to_string());
            }
        }

        if self.cancel.is_cancelled() {
            return Ok(CommandResult::interrupted());
        }
        if !report.passed() {
            return Ok(CommandResult::failure(1));
        }

        if verbose {
            ui.success(&format!("All {} prerequisites satisfied", report.len()));
        }
        Ok(CommandResult::success())
    }
}
