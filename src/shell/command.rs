//! External command execution.
//!
//! Commands are run directly (no intermediate shell) from a
//! whitespace-separated invocation such as `git svn`. Every wait is bounded:
//! the child is polled at [`POLL_INTERVAL`] and killed when the
//! [`CancelToken`] is raised or the optional timeout elapses.

use crate::error::{Result, SvnmigError};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::cancel::{CancelToken, POLL_INTERVAL};

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    /// Create a spec for a bare program.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    /// Split a whitespace-separated invocation into program and arguments.
    ///
    /// Returns `None` for a blank string.
    pub fn parse(invocation: &str) -> Option<Self> {
        let mut parts = invocation.split_whitespace();
        let program = parts.next()?;
        Some(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Append an argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// The program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build a `std::process::Command` for this spec.
    ///
    /// On unix the child leads a new process group, so [`terminate`] also
    /// reaches anything it spawns.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut cmd, 0);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed for exceeding its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// First line of stdout, without the line terminator.
    pub fn first_line(&self) -> &str {
        self.stdout.lines().next().unwrap_or("")
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Kill the command after this long (None = no timeout).
    pub timeout: Option<Duration>,
}

/// Execute a command, capturing stdout and stderr.
///
/// Fails with `LaunchError` if the program cannot be started and with
/// `Cancelled` if the token is raised while it runs. A timeout is not an
/// error: the child is killed and the result has `timed_out` set.
pub fn execute(
    spec: &CommandSpec,
    options: &CommandOptions,
    cancel: &CancelToken,
) -> Result<CommandResult> {
    let start = Instant::now();
    tracing::debug!("Running {}", spec);

    let mut cmd = spec.to_command();
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| SvnmigError::LaunchError {
        command: spec.to_string(),
        source,
    })?;

    // Drain both pipes on their own threads so a chatty child never blocks
    // on a full pipe while we poll for its exit.
    let stdout_handle = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = out.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });
    let stderr_handle = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = err.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let deadline = options.timeout.map(|t| start + t);
    let mut timed_out = false;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancel.is_cancelled() {
            terminate(&mut child);
            return Err(SvnmigError::Cancelled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::debug!("{} exceeded its timeout, killing it", spec);
            timed_out = true;
            match terminate(&mut child) {
                Some(status) => break status,
                None => break child.wait()?,
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout_handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default();
    let stderr = stderr_handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default();

    Ok(CommandResult {
        exit_code: status.code(),
        stdout,
        stderr,
        duration: start.elapsed(),
        success: status.success() && !timed_out,
        timed_out,
    })
}

/// Kill a child and its process group, then reap the child so it does not
/// linger as a zombie.
pub(crate) fn terminate(child: &mut Child) -> Option<ExitStatus> {
    kill_group(child.id());
    if let Err(e) = child.kill() {
        tracing::debug!("kill failed (child already exited?): {}", e);
    }
    child.wait().ok()
}

/// SIGKILL every process in the group led by `pid`.
///
/// Safe to call after the leader has been reaped: a group id is not reused
/// while any member is alive, and an empty group is simply not found.
#[cfg(unix)]
pub(crate) fn kill_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        tracing::debug!(
            "kill of process group {} failed: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
pub(crate) fn kill_group(_pid: u32) {}
