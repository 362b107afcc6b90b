//! Concurrent dependency verification.
//!
//! The `DependencyChecker` starts every probe on its own thread at once and
//! hands the receiving end to a [`ResultAggregator`]. No probe waits on
//! another, and every failure is reported.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::shell::CancelToken;

use super::aggregator::{ProbeReporter, ResultAggregator, VerificationReport};
use super::probe::Probe;

/// Runs a set of probes concurrently.
#[derive(Default)]
pub struct DependencyChecker {
    probes: Vec<Arc<dyn Probe>>,
}

impl DependencyChecker {
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self { probes }
    }

    /// Add a probe. Reports list probes in the order they were added.
    pub fn with_probe<P: Probe + 'static>(mut self, probe: P) -> Self {
        self.probes.push(Arc::new(probe));
        self
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Run every probe and wait at most `timeout` for all of them.
    ///
    /// Probes still running at the deadline, or when `cancel` is raised,
    /// are told to stop and reported as timed out or cancelled.
    pub fn run(&self, timeout: Duration, cancel: &CancelToken) -> VerificationReport {
        let deadline = Instant::now() + timeout;
        let (tx, rx) = mpsc::channel();
        let probe_cancel = cancel.child();

        let names = self.probes.iter().map(|p| p.name().to_string()).collect();
        let aggregator = ResultAggregator::new(names, rx);

        tracing::debug!("Starting {} probes", self.probes.len());
        for (index, probe) in self.probes.iter().enumerate() {
            let reporter = ProbeReporter::new(index, probe.name(), tx.clone());
            let probe = Arc::clone(probe);
            let token = probe_cancel.clone();
            let spawned = thread::Builder::new()
                .name(format!("probe-{}", index))
                .spawn(move || {
                    let outcome = probe.run(&token);
                    reporter.report(outcome);
                });
            // On failure the closure is dropped and its reporter sends a
            // Panicked outcome.
            if let Err(e) = spawned {
                tracing::warn!("Could not start probe thread: {}", e);
            }
        }
        drop(tx);

        let report = aggregator.collect(deadline, timeout, cancel, &probe_cancel);
        tracing::info!(
            "Verified {} dependencies, {} failed",
            report.len(),
            report.failures().count()
        );
        report
    }
}
