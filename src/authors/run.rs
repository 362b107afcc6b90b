//! Orchestrated extraction run.
//!
//! A run moves through `Idle → Streaming → Draining → Completed`, or to
//! `Failed` from any step. Three activities proceed at once: the source's
//! reader thread pushes lines, one consumer thread turns them into records,
//! and the calling thread watches the process exit status and the cancel
//! token. The consumer is the only writer to the sink.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Result, SvnmigError};
use crate::shell::{CancelToken, CommandSpec, LogLineSource, POLL_INTERVAL};

use super::extractor::{AuthorExtractor, ExtractionStats};
use super::registry::AuthorRegistry;
use super::sink::AuthorSink;

/// How long a cancelled run waits for the consumer before abandoning it.
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle of an extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Streaming,
    Draining,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Streaming => "streaming",
            RunState::Draining => "draining",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Log command, e.g. `svn log --quiet`.
    pub log_command: CommandSpec,
    /// Directory the log command runs in.
    pub working_dir: Option<PathBuf>,
    /// Email domain for records.
    pub domain: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Per-line counters.
    pub stats: ExtractionStats,
    /// Distinct authors in the registry at the end of the run.
    pub distinct_authors: usize,
}

/// One extraction from a log process into a sink.
#[derive(Debug)]
pub struct ExtractionRun {
    options: ExtractionOptions,
    registry: Arc<AuthorRegistry>,
    state: RunState,
}

impl ExtractionRun {
    /// Prepare a run with a fresh registry.
    pub fn new(options: ExtractionOptions) -> Self {
        Self {
            options,
            registry: Arc::new(AuthorRegistry::new()),
            state: RunState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the run to completion.
    ///
    /// Records already written stay in the sink on failure; re-running is
    /// the recovery path.
    pub fn run<S>(&mut self, sink: S, cancel: &CancelToken) -> Result<ExtractionReport>
    where
        S: AuthorSink + 'static,
    {
        self.run_with(|| Ok(sink), cancel)
    }

    /// Like [`run`](Self::run), but the sink is opened only once the log
    /// process has started. A launch failure leaves existing output alone.
    pub fn run_with<S, F>(&mut self, open_sink: F, cancel: &CancelToken) -> Result<ExtractionReport>
    where
        S: AuthorSink + 'static,
        F: FnOnce() -> Result<S>,
    {
        let result = self.drive(open_sink, cancel);
        match &result {
            Ok(report) => {
                self.transition(RunState::Completed);
                tracing::info!(
                    "Extracted {} authors from {} lines ({} malformed)",
                    report.stats.authors,
                    report.stats.lines,
                    report.stats.malformed
                );
            }
            Err(e) => {
                self.transition(RunState::Failed);
                tracing::debug!("Extraction failed: {}", e);
            }
        }
        result
    }

    fn drive<S, F>(&mut self, open_sink: F, cancel: &CancelToken) -> Result<ExtractionReport>
    where
        S: AuthorSink + 'static,
        F: FnOnce() -> Result<S>,
    {
        let mut source = LogLineSource::spawn(
            &self.options.log_command,
            self.options.working_dir.as_deref(),
        )?;
        let lines = source.take_lines().ok_or_else(|| SvnmigError::ReadError {
            command: source.command().to_string(),
            message: "line stream already taken".to_string(),
        })?;
        let sink = open_sink()?;

        let extractor = AuthorExtractor::new(
            Arc::clone(&self.registry),
            sink,
            &self.options.domain,
        );
        let mut consumer = Some(thread::spawn(move || extractor.consume(lines)));
        self.transition(RunState::Streaming);

        // Watch the process and the consumer side by side. Either may
        // finish first; neither is allowed to mask the other.
        let mut consumed: Option<Result<ExtractionStats>> = None;
        loop {
            if cancel.is_cancelled() {
                source.kill();
                if let Some(handle) = consumer.take() {
                    let _ = await_consumer(handle, &mut source, cancel);
                }
                return Err(SvnmigError::Cancelled);
            }

            if consumer.as_ref().is_some_and(|h| h.is_finished()) {
                if let Some(handle) = consumer.take() {
                    let result = join_consumer(handle);
                    if let Err(e) = result {
                        source.kill();
                        return Err(e);
                    }
                    consumed = Some(result);
                }
            }

            if source.try_wait()?.is_some() {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        self.transition(RunState::Draining);
        let stats = match consumed {
            Some(result) => result,
            None => match consumer.take() {
                Some(handle) => await_consumer(handle, &mut source, cancel),
                None => Err(consumer_missing()),
            },
        }?;

        source.finish()?;

        Ok(ExtractionReport {
            stats,
            distinct_authors: self.registry.len(),
        })
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!("Extraction {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Wait for the consumer while watching `cancel`.
///
/// On cancellation the source is killed and the consumer gets
/// [`CANCEL_GRACE`] to notice the closed stream; after that it is abandoned.
fn await_consumer(
    handle: JoinHandle<Result<ExtractionStats>>,
    source: &mut LogLineSource,
    cancel: &CancelToken,
) -> Result<ExtractionStats> {
    let mut cancelled_at: Option<Instant> = None;
    while !handle.is_finished() {
        if cancel.is_cancelled() {
            let since = *cancelled_at.get_or_insert_with(|| {
                source.kill();
                Instant::now()
            });
            if since.elapsed() >= CANCEL_GRACE {
                tracing::debug!("Abandoning author consumer after cancellation");
                return Err(SvnmigError::Cancelled);
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    let result = join_consumer(handle);
    if cancelled_at.is_some() {
        return Err(SvnmigError::Cancelled);
    }
    result
}

fn join_consumer(handle: JoinHandle<Result<ExtractionStats>>) -> Result<ExtractionStats> {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow::anyhow!("author consumer panicked").into()))
}

fn consumer_missing() -> SvnmigError {
    anyhow::anyhow!("author consumer was never started").into()
}
