//! Fan-in of probe outcomes.
//!
//! The outstanding count is fixed before any probe starts and only the
//! aggregator decrements it. Each probe reports through a [`ProbeReporter`]
//! that sends exactly one outcome, even when the probe panics, so the
//! count reaches zero exactly once. Waits are bounded by `recv_timeout`.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::shell::{CancelToken, POLL_INTERVAL};

use super::status::{ProbeFailure, ProbeOutcome, ProbeResult};

/// Outstanding probe count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWork {
    remaining: usize,
}

impl PendingWork {
    /// Expect `count` completions.
    pub fn new(count: usize) -> Self {
        Self { remaining: count }
    }

    /// Record one completion. Returns true when this was the last one.
    pub fn complete(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Completions still outstanding.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// True once every expected completion has been recorded.
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// A probe index paired with its outcome.
pub type ProbeReport = (usize, ProbeOutcome);

/// Sends one probe's outcome to the aggregator.
///
/// Dropping a reporter without calling [`report`](Self::report) sends a
/// `Panicked` failure instead.
#[derive(Debug)]
pub struct ProbeReporter {
    index: usize,
    name: String,
    tx: Option<Sender<ProbeReport>>,
}

impl ProbeReporter {
    /// Reporter for the probe at `index` in declaration order.
    pub fn new(index: usize, name: &str, tx: Sender<ProbeReport>) -> Self {
        Self {
            index,
            name: name.to_string(),
            tx: Some(tx),
        }
    }

    /// Send `outcome` and consume the reporter.
    pub fn report(mut self, outcome: ProbeOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: ProbeOutcome) {
        if let Some(tx) = self.tx.take() {
            // The aggregator may already have given up on us.
            let _ = tx.send((self.index, outcome));
        }
    }
}

impl Drop for ProbeReporter {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::debug!("Probe {} ended without reporting", self.name);
            let name = self.name.clone();
            self.send(ProbeFailure::Panicked { name }.into());
        }
    }
}

/// Why collection stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Deadline,
    Cancelled,
    Disconnected,
}

/// Collects outcomes into declaration order.
#[derive(Debug)]
pub struct ResultAggregator {
    names: Vec<String>,
    slots: Vec<Option<ProbeOutcome>>,
    pending: PendingWork,
    rx: Receiver<ProbeReport>,
}

impl ResultAggregator {
    /// Expect one outcome for each name, indexed by position.
    pub fn new(names: Vec<String>, rx: Receiver<ProbeReport>) -> Self {
        let count = names.len();
        Self {
            slots: vec![None; count],
            pending: PendingWork::new(count),
            names,
            rx,
        }
    }

    /// Snapshot of the outstanding count.
    pub fn pending(&self) -> PendingWork {
        self.pending
    }

    /// Store an outcome. Unknown indexes and repeat reports are ignored.
    pub fn accept(&mut self, index: usize, outcome: ProbeOutcome) {
        let Some(slot) = self.slots.get_mut(index) else {
            tracing::debug!("Ignoring report for unknown probe {}", index);
            return;
        };
        if slot.is_some() {
            tracing::debug!("Ignoring repeat report for {}", self.names[index]);
            return;
        }
        tracing::debug!(
            "{}: {}",
            self.names[index],
            if outcome.is_passed() { "passed" } else { "failed" }
        );
        *slot = Some(outcome);
        self.pending.complete();
    }

    /// Wait until every probe has reported, `deadline` passes or `cancel`
    /// is raised.
    ///
    /// When stopping early, `probe_cancel` is raised so running probes kill
    /// their subprocesses, and every probe that has not reported gets a
    /// synthesized outcome. The report always has one result per probe.
    pub fn collect(
        mut self,
        deadline: Instant,
        timeout: Duration,
        cancel: &CancelToken,
        probe_cancel: &CancelToken,
    ) -> VerificationReport {
        let mut stop = None;
        while !self.pending.is_done() {
            if cancel.is_cancelled() {
                stop = Some(Stop::Cancelled);
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                stop = Some(Stop::Deadline);
                break;
            }
            match self.rx.recv_timeout((deadline - now).min(POLL_INTERVAL)) {
                Ok((index, outcome)) => self.accept(index, outcome),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    stop = Some(Stop::Disconnected);
                    break;
                }
            }
        }

        if let Some(stop) = stop {
            tracing::debug!(
                "Stopped waiting with {} probes outstanding ({:?})",
                self.pending.remaining(),
                stop
            );
            probe_cancel.cancel();
        }

        let results = self
            .names
            .into_iter()
            .zip(self.slots)
            .map(|(name, slot)| {
                let outcome = slot.unwrap_or_else(|| synthesize(&name, stop, timeout));
                ProbeResult { name, outcome }
            })
            .collect();
        VerificationReport { results }
    }
}

fn synthesize(name: &str, stop: Option<Stop>, timeout: Duration) -> ProbeOutcome {
    let name = name.to_string();
    let failure = match stop {
        Some(Stop::Cancelled) => ProbeFailure::Cancelled { name },
        Some(Stop::Deadline) => ProbeFailure::TimedOut {
            name,
            secs: timeout.as_secs(),
        },
        Some(Stop::Disconnected) | None => ProbeFailure::Panicked { name },
    };
    failure.into()
}

/// Outcome of a verification run, in probe declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// One result per probe.
    pub results: Vec<ProbeResult>,
}

impl VerificationReport {
    /// True iff every probe passed.
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_passed())
    }

    /// Results that did not pass, in declaration order.
    pub fn failures(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| !r.outcome.is_passed())
    }

    /// Number of probes reported on.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when no probes were run.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
