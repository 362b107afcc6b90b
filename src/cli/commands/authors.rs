//! Authors command implementation.
//!
//! The `svnmig authors` command streams the repository log and writes one
//! `name = name <name@domain>` line per distinct author.

use std::path::{Path, PathBuf};

use crate::authors::{ExtractionOptions, ExtractionRun, FileSink};
use crate::cli::args::AuthorsArgs;
use crate::config::{load_config, validate, AuthorsConfig};
use crate::error::{Result, SvnmigError};
use crate::shell::CancelToken;
use crate::ui::{OutputMode, Prompt, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The authors command implementation.
pub struct AuthorsCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    cancel: CancelToken,
    args: AuthorsArgs,
}

impl AuthorsCommand {
    /// Create a new authors command.
    pub fn new(project_root: &Path, args: AuthorsArgs) -> Self {
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

    /// Token that interrupts the run.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &AuthorsArgs {
        &self.args
    }

    /// Configured settings with command-line flags applied on top.
    fn settings(&self) -> Result<AuthorsConfig> {
        let mut config = load_config(&self.project_root, self.config_override.as_deref())?;

        let authors = &mut config.authors;
        if let Some(output) = &self.args.output {
            authors.output = output.clone();
        }
        if let Some(domain) = &self.args.domain {
            authors.domain = domain.clone();
        }
        if let Some(repo) = &self.args.repo {
            authors.repo = repo.clone();
        }
        if let Some(log_command) = &self.args.log_command {
            authors.log_command = log_command.clone();
        }

        validate(&config)?;
        Ok(config.authors)
    }

    fn confirm_overwrite(&self, ui: &mut dyn UserInterface, output: &Path) -> Result<bool> {
        if self.args.force || !output.exists() {
            return Ok(true);
        }
        if !ui.is_interactive() {
            tracing::debug!("No terminal to ask; using the overwrite default");
        }
        let prompt = Prompt::new(
            "overwrite",
            &format!("{} already exists. Overwrite it?", output.display()),
            true,
        );
        ui.confirm(&prompt)
    }
}

impl Command for AuthorsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = self.settings()?;
        let output = settings.output.clone();

        ui.message(&output.display().to_string());

        if !self.confirm_overwrite(ui, &output)? {
            ui.warning(&format!("Left {} untouched", output.display()));
            return Ok(CommandResult::failure(1));
        }

        let options = ExtractionOptions {
            log_command: settings.log_command_spec()?,
            working_dir: Some(settings.repo.clone()),
            domain: settings.domain.clone(),
        };

        let mut spinner = ui.start_spinner(&format!("Reading log from {}", settings.repo.display()));
        let mut run = ExtractionRun::new(options);
        let report = match run.run_with(|| FileSink::create(&output), &self.cancel) {
            Ok(report) => report,
            Err(e @ SvnmigError::LaunchError { .. }) => {
                spinner.finish_clear();
                return Err(e);
            }
            Err(SvnmigError::Cancelled) => {
                spinner.finish_error("Interrupted");
                ui.warning(&format!("{} is incomplete", output.display()));
                return Ok(CommandResult::interrupted());
            }
            Err(e) => {
                spinner.finish_clear();
                ui.warning(&format!(
                    "{} may be incomplete; re-run to regenerate it",
                    output.display()
                ));
                return Err(e);
            }
        };
        spinner.finish_clear();

        let stats = report.stats;
        if ui.output_mode() == OutputMode::Verbose {
            ui.message(&format!(
                "{} log lines, {} revisions, {} repeated authors",
                stats.lines, stats.headers, stats.duplicates
            ));
        }
        if stats.malformed > 0 {
            ui.warning(&format!("Skipped {} malformed log entries", stats.malformed));
        }
        ui.success(&format!(
            "{} authors written to {}",
            stats.authors,
            output.display()
        ));

        Ok(CommandResult::success())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    const LOG: &str = "\
------------------------------------------------------------------------
r3 | carol | 2012-03-01 10:00:00 +0000 (Thu, 01 Mar 2012)
------------------------------------------------------------------------
r2 | alice | 2012-02-01 10:00:00 +0000 (Wed, 01 Feb 2012)
------------------------------------------------------------------------
r1 | carol | 2012-01-01 10:00:00 +0000 (Sun, 01 Jan 2012)
------------------------------------------------------------------------
";

    struct Fixture {
        temp: TempDir,
    }

    impl Fixture {
        fn new(log: &str) -> Self {
            let temp = TempDir::new().unwrap();
            fs::write(temp.path().join("log.txt"), log).unwrap();
            Self { temp }
        }

        fn output(&self) -> PathBuf {
            self.temp.path().join("authors.txt")
        }

        fn args(&self) -> AuthorsArgs {
            AuthorsArgs {
                output: Some(self.output()),
                domain: Some("example.com".to_string()),
                repo: Some(self.temp.path().to_path_buf()),
                log_command: Some("cat log.txt".to_string()),
                force: false,
            }
        }

        fn command(&self, args: AuthorsArgs) -> AuthorsCommand {
            AuthorsCommand::new(self.temp.path(), args)
        }
    }

    #[test]
    fn writes_first_sighting_of_each_author() {
        let fx = Fixture::new(LOG);
        let mut ui = MockUI::new();

        let result = fx.command(fx.args()).execute(&mut ui).unwrap();

        assert!(result.success);
        assert_eq!(
            fs::read_to_string(fx.output()).unwrap(),
            "carol = carol <carol@example.com>\nalice = alice <alice@example.com>\n"
        );
        assert!(ui.has_message("authors.txt"));
        assert!(ui.has_success("2 authors written to"));
    }

    #[test]
    fn verbose_mode_reports_counters() {
        let fx = Fixture::new(LOG);
        let mut ui = MockUI::with_mode(OutputMode::Verbose);

        fx.command(fx.args()).execute(&mut ui).unwrap();

        assert!(ui.has_message("3 revisions, 1 repeated authors"));
    }

    #[test]
    fn malformed_entries_produce_warning() {
        let fx = Fixture::new("r1 |  | 2012-01-01\nr2 | bob | 2012-01-02\n");
        let mut ui = MockUI::new();

        let result = fx.command(fx.args()).execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_warning("Skipped 1 malformed"));
        assert_eq!(
            fs::read_to_string(fx.output()).unwrap(),
            "bob = bob <bob@example.com>\n"
        );
    }

    #[test]
    fn declined_overwrite_keeps_existing_file() {
        let fx = Fixture::new(LOG);
        fs::write(fx.output(), "keep me\n").unwrap();
        let mut ui = MockUI::new();
        ui.set_prompt_response("overwrite", false);

        let result = fx.command(fx.args()).execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert_eq!(ui.prompts_shown(), &["overwrite".to_string()]);
        assert_eq!(fs::read_to_string(fx.output()).unwrap(), "keep me\n");
    }

    #[test]
    fn force_skips_the_prompt() {
        let fx = Fixture::new(LOG);
        fs::write(fx.output(), "old\n").unwrap();
        let mut ui = MockUI::new();
        let args = AuthorsArgs {
            force: true,
            ..fx.args()
        };

        let result = fx.command(args).execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.prompts_shown().is_empty());
        assert!(fs::read_to_string(fx.output()).unwrap().starts_with("carol = "));
    }

    #[test]
    fn failing_log_command_is_an_error() {
        let fx = Fixture::new(LOG);
        let mut ui = MockUI::new();
        let args = AuthorsArgs {
            log_command: Some("cat missing.txt".to_string()),
            ..fx.args()
        };

        let err = fx.command(args).execute(&mut ui).unwrap_err();

        assert!(matches!(err, SvnmigError::ProcessError { .. }));
        assert!(ui.has_warning("may be incomplete"));
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let fx = Fixture::new(LOG);
        let mut ui = MockUI::new();
        let args = AuthorsArgs {
            log_command: Some("svnmig-no-such-program log".to_string()),
            ..fx.args()
        };

        let err = fx.command(args).execute(&mut ui).unwrap_err();

        assert!(matches!(err, SvnmigError::LaunchError { .. }));
        assert!(!fx.output().exists());
    }

    #[test]
    fn launch_failure_keeps_existing_output() {
        let fx = Fixture::new(LOG);
        fs::write(fx.output(), "alice = alice <alice@example.com>\n").unwrap();
        let mut ui = MockUI::new();
        let args = AuthorsArgs {
            log_command: Some("svnmig-no-such-svn log --quiet".to_string()),
            force: true,
            ..fx.args()
        };

        let err = fx.command(args).execute(&mut ui).unwrap_err();

        assert!(matches!(err, SvnmigError::LaunchError { .. }));
        assert_eq!(
            fs::read_to_string(fx.output()).unwrap(),
            "alice = alice <alice@example.com>\n"
        );
        assert!(!ui.has_warning("may be incomplete"));
    }

    #[test]
    fn empty_domain_fails_validation() {
        let fx = Fixture::new(LOG);
        let mut ui = MockUI::new();
        let args = AuthorsArgs {
            domain: Some(String::new()),
            ..fx.args()
        };

        let err = fx.command(args).execute(&mut ui).unwrap_err();

        assert!(matches!(err, SvnmigError::ConfigValidationError { .. }));
        assert!(!fx.output().exists());
    }

    #[test]
    fn cancelled_run_exits_interrupted() {
        let fx = Fixture::new(LOG);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut ui = MockUI::new();
        let args = AuthorsArgs {
            log_command: Some("sleep 5".to_string()),
            ..fx.args()
        };

        let result = fx.command(args).with_cancel(cancel).execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 130);
        assert_eq!(ui.spinner_results(), vec!["err: Interrupted".to_string()]);
    }

    #[test]
    fn config_file_supplies_defaults() {
        let fx = Fixture::new(LOG);
        let config = fx.temp.path().join("svnmig.yml");
        fs::write(&config, "authors:\n  domain: corp.example\n").unwrap();
        let mut ui = MockUI::new();
        let args = AuthorsArgs {
            domain: None,
            ..fx.args()
        };

        fx.command(args)
            .with_config_override(Some(&config))
            .execute(&mut ui)
            .unwrap();

        assert!(fs::read_to_string(fx.output())
            .unwrap()
            .contains("<alice@corp.example>"));
    }
}
