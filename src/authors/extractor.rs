//! Author extraction from `svn log --quiet` output.
//!
//! Only revision header lines are consumed:
//!
//! ```text
//! r1234 | alice | 2012-03-04 10:11:12 +0000 (Sun, 04 Mar 2012)
//! ```
//!
//! Everything else (separator rules, messages) is ignored.

use std::sync::Arc;

use crate::error::Result;

use super::registry::AuthorRegistry;
use super::sink::{AuthorRecord, AuthorSink};

/// Classification of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    /// A revision header carrying this author.
    Author(&'a str),
    /// Not a revision header.
    Ignored,
    /// Looks like a header but has no author field.
    Malformed,
}

/// Classify a log line and pull out its author.
///
/// A header is any line starting with `r`. Its author is the second
/// `|`-separated field with surrounding whitespace removed; a header
/// without a non-empty second field is malformed.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    if !line.starts_with('r') {
        return ParsedLine::Ignored;
    }
    match line.split('|').nth(1).map(str::trim) {
        Some(author) if !author.is_empty() => ParsedLine::Author(author),
        _ => ParsedLine::Malformed,
    }
}

/// What happened to one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// First sighting; a record was written.
    NewAuthor,
    /// Author already registered.
    Duplicate,
    /// Not a header.
    Ignored,
    /// Header without an author; skipped.
    Malformed,
}

/// Counters for one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Lines seen.
    pub lines: u64,
    /// Header lines with an author.
    pub headers: u64,
    /// Records written.
    pub authors: u64,
    /// Headers whose author was already registered.
    pub duplicates: u64,
    /// Headers skipped as malformed.
    pub malformed: u64,
}

/// Turns log lines into author records.
///
/// The registry decides first sightings; only those reach the sink.
pub struct AuthorExtractor<S> {
    registry: Arc<AuthorRegistry>,
    sink: S,
    domain: String,
    stats: ExtractionStats,
}

impl<S: AuthorSink> AuthorExtractor<S> {
    /// Create an extractor writing to `sink` with addresses at `domain`.
    pub fn new(registry: Arc<AuthorRegistry>, sink: S, domain: &str) -> Self {
        Self {
            registry,
            sink,
            domain: domain.to_string(),
            stats: ExtractionStats::default(),
        }
    }

    /// Process one line. Only sink failures are errors.
    pub fn process_line(&mut self, line: &str) -> Result<LineOutcome> {
        self.stats.lines += 1;

        let author = match parse_line(line) {
            ParsedLine::Author(author) => author,
            ParsedLine::Ignored => return Ok(LineOutcome::Ignored),
            ParsedLine::Malformed => {
                self.stats.malformed += 1;
                tracing::warn!(
                    "Skipping malformed log entry at line {}: {:?}",
                    self.stats.lines,
                    line
                );
                return Ok(LineOutcome::Malformed);
            }
        };

        self.stats.headers += 1;
        if !self.registry.insert_if_absent(author) {
            self.stats.duplicates += 1;
            return Ok(LineOutcome::Duplicate);
        }

        self.sink.append(&AuthorRecord::new(author, &self.domain))?;
        self.stats.authors += 1;
        tracing::debug!("New author: {}", author);
        Ok(LineOutcome::NewAuthor)
    }

    /// Process every line in order, then flush the sink.
    pub fn consume<I>(mut self, lines: I) -> Result<ExtractionStats>
    where
        I: IntoIterator<Item = String>,
    {
        for line in lines {
            self.process_line(&line)?;
        }
        self.sink.flush()?;
        Ok(self.stats)
    }

    /// Counters so far.
    pub fn stats(&self) -> ExtractionStats {
        self.stats
    }
}
