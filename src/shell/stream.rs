//! Line streaming from a long-running external process.
//!
//! [`LogLineSource`] starts a command and turns its stdout into an ordered,
//! lazily produced sequence of lines. A reader thread pushes lines through a
//! bounded channel while the process runs, so memory stays bounded no matter
//! how long the log is. Exit status is observed separately through
//! [`LogLineSource::try_wait`], so a failing process and a failing consumer
//! are detected independently.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use crate::error::{Result, SvnmigError};

use super::cancel::{CancelToken, POLL_INTERVAL};
use super::command::{kill_group, terminate, CommandSpec};

/// Maximum number of lines buffered between the reader and the consumer.
pub const LINE_BUFFER: usize = 1024;

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL: usize = 20;

/// A running process whose stdout is exposed as a stream of lines.
#[derive(Debug)]
pub struct LogLineSource {
    command: String,
    child: Child,
    lines: Option<Receiver<String>>,
    reader: Option<JoinHandle<std::io::Result<u64>>>,
    stderr: Option<JoinHandle<String>>,
    status: Option<ExitStatus>,
}

impl LogLineSource {
    /// Start `spec` in `working_dir` and begin streaming its stdout.
    ///
    /// Fails with `LaunchError` if the process cannot start and with
    /// `ReadError` if its stdout cannot be captured.
    pub fn spawn(spec: &CommandSpec, working_dir: Option<&Path>) -> Result<Self> {
        let command = spec.to_string();
        let mut cmd = spec.to_command();
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| SvnmigError::LaunchError {
            command: command.clone(),
            source,
        })?;
        tracing::debug!("Spawned '{}' (pid {})", command, child.id());

        let Some(stdout) = child.stdout.take() else {
            terminate(&mut child);
            return Err(SvnmigError::ReadError {
                command,
                message: "stdout was not captured".to_string(),
            });
        };

        let (tx, rx) = mpsc::sync_channel(LINE_BUFFER);
        let reader = thread::spawn(move || pump_lines(stdout, tx));
        let stderr = child
            .stderr
            .take()
            .map(|err| thread::spawn(move || tail_lines(err, STDERR_TAIL)));

        Ok(Self {
            command,
            child,
            lines: Some(rx),
            reader: Some(reader),
            stderr,
            status: None,
        })
    }

    /// The command line being run, for messages.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Hand out the line stream. Only the first call returns `Some`.
    pub fn take_lines(&mut self) -> Option<LogLines> {
        self.lines.take().map(|rx| LogLines { rx })
    }

    /// Check for process exit without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if self.status.is_none() {
            self.status = self.child.try_wait()?;
        }
        Ok(self.status)
    }

    /// Kill the process and everything it spawned.
    ///
    /// Once no process holds its stdout the line stream ends, which releases
    /// a consumer blocked waiting for the next line. The group is signalled
    /// even after the direct child has exited, since a descendant may still
    /// hold the pipe.
    pub fn kill(&mut self) {
        tracing::debug!("Killing '{}'", self.command);
        match self.status {
            None => self.status = terminate(&mut self.child),
            Some(_) => kill_group(self.child.id()),
        }
    }

    /// Block until the process exits, then [`finish`](Self::finish).
    ///
    /// Polls every [`POLL_INTERVAL`]; if `cancel` is raised first the child
    /// is killed and `Cancelled` returned. The line stream must be drained
    /// by someone else, or a chatty process fills the buffer and never exits.
    pub fn wait(mut self, cancel: &CancelToken) -> Result<u64> {
        while self.try_wait()?.is_none() {
            if cancel.is_cancelled() {
                self.kill();
                return Err(SvnmigError::Cancelled);
            }
            thread::sleep(POLL_INTERVAL);
        }
        self.finish()
    }

    /// Wait for the reader threads after the process has exited.
    ///
    /// Returns the number of lines read, a `ReadError` if stdout failed
    /// mid-stream, or a `ProcessError` (carrying the stderr tail) if the
    /// process exited with a non-zero status. A process error takes
    /// precedence over a read error.
    pub fn finish(mut self) -> Result<u64> {
        let status = match self.status {
            Some(status) => status,
            None => {
                let status = self.child.wait()?;
                self.status = Some(status);
                status
            }
        };

        let read = self
            .reader
            .take()
            .map(|h| h.join().unwrap_or_else(|_| Err(reader_panicked())))
            .unwrap_or(Ok(0));
        let stderr = self
            .stderr
            .take()
            .map(|h| h.join().unwrap_or_default())
            .unwrap_or_default();

        let command = std::mem::take(&mut self.command);
        if !status.success() {
            return Err(SvnmigError::ProcessError {
                command,
                code: status.code(),
                stderr,
            });
        }

        read.map_err(|e| SvnmigError::ReadError {
            command,
            message: e.to_string(),
        })
    }
}

impl Drop for LogLineSource {
    fn drop(&mut self) {
        // Never leave a running child behind, whatever path dropped us.
        if self.status.is_none() {
            if let Ok(None) = self.child.try_wait() {
                terminate(&mut self.child);
            }
        }
    }
}

/// Ordered lines from a [`LogLineSource`]. Ends when the process closes
/// its stdout.
#[derive(Debug)]
pub struct LogLines {
    rx: Receiver<String>,
}

impl Iterator for LogLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.rx.recv().ok()
    }
}

fn reader_panicked() -> std::io::Error {
    std::io::Error::other("line reader thread panicked")
}

/// Read lines from `input` and forward them until EOF or until the
/// receiving side goes away.
fn pump_lines<R: Read>(input: R, tx: SyncSender<String>) -> std::io::Result<u64> {
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(count);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.send(line).is_err() {
            tracing::debug!("Line consumer went away after {} lines", count);
            return Ok(count);
        }
        count += 1;
    }
}

/// Keep the last `keep` lines of `input`.
fn tail_lines<R: Read>(input: R, keep: usize) -> String {
    let mut tail = VecDeque::with_capacity(keep);
    for line in BufReader::new(input)
        .lines()
        .map_while(std::result::Result::ok)
    {
        if tail.len() == keep {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("\n")
}
