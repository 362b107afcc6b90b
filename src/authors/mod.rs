//! Authors file extraction.
//!
//! The pipeline streams the repository log, keeps the first sighting of
//! every author, and appends one mapping line per new author:
//!
//! ```text
//! LogLineSource → AuthorExtractor → AuthorRegistry → AuthorSink
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use svnmig::authors::{AuthorExtractor, AuthorRegistry, MemorySink};
//!
//! let sink = MemorySink::new();
//! let extractor = AuthorExtractor::new(Arc::new(AuthorRegistry::new()), sink.clone(), "example.com");
//! extractor
//!     .consume(vec!["r1 | alice | 2012-01-01".to_string()])
//!     .unwrap();
//! assert_eq!(sink.contents(), "alice = alice <alice@example.com>\n");
//! ```

pub mod extractor;
pub mod registry;
pub mod run;
pub mod sink;

pub use extractor::{parse_line, AuthorExtractor, ExtractionStats, LineOutcome, ParsedLine};
pub use registry::AuthorRegistry;
pub use run::{ExtractionOptions, ExtractionReport, ExtractionRun, RunState};
pub use sink::{AuthorRecord, AuthorSink, FileSink, MemorySink};
