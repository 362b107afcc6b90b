//! Migration prerequisite verification.
//!
//! Checks that the tools a migration needs are installed at a recent
//! enough version and that the network is reachable. Probes run
//! concurrently and every failure is reported.
//!
//! # Modules
//!
//! - [`version`] - Structured version parsing and comparison
//! - [`status`] - Probe outcomes and failure reasons
//! - [`probe`] - Tool and connectivity probes
//! - [`aggregator`] - Counted, bounded fan-in of probe outcomes
//! - [`checker`] - Concurrent fan-out of probes
//!
//! # Example
//!
//! ```no_run
//! use svnmig::requirements::{Dependency, DependencyChecker, ToolProbe, Version};
//! use svnmig::shell::{CancelToken, CommandSpec};
//! use std::time::Duration;
//!
//! let git = Dependency::new("Git", Version::parse("1.7.7.5").unwrap(), CommandSpec::new("git"));
//! let report = DependencyChecker::default()
//!     .with_probe(ToolProbe::new(git))
//!     .run(Duration::from_secs(30), &CancelToken::new());
//! for failure in report.failures() {
//!     eprintln!("{}", failure.outcome);
//! }
//! ```

pub mod aggregator;
pub mod checker;
pub mod probe;
pub mod status;
pub mod version;

pub use aggregator::{PendingWork, ProbeReporter, ResultAggregator, VerificationReport};
pub use checker::DependencyChecker;
pub use probe::{ConnectivityProbe, Dependency, Probe, ToolProbe, VERSION_ARG};
pub use status::{ProbeFailure, ProbeOutcome, ProbeResult};
pub use version::{extract_version, Segment, Version};
