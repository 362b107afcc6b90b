//! Authors file records and the sinks they are written to.

use std::fmt;
use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Result, SvnmigError};

/// One line of the authors file.
///
/// Renders as `NAME = NAME <NAME@DOMAIN>`, the mapping format accepted by
/// `git svn --authors-file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    /// Author identifier from the log.
    pub identifier: String,
    /// Email domain.
    pub domain: String,
}

impl AuthorRecord {
    /// Create a record for `identifier` at `domain`.
    pub fn new(identifier: &str, domain: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            domain: domain.to_string(),
        }
    }
}

impl fmt::Display for AuthorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{id} = {id} <{id}@{domain}>",
            id = self.identifier,
            domain = self.domain
        )
    }
}

/// Destination for newly seen authors.
///
/// A sink is owned by exactly one consumer, so records are appended
/// serially and never interleave.
pub trait AuthorSink: Send {
    /// Append one record, terminated by a newline.
    fn append(&mut self, record: &AuthorRecord) -> Result<()>;

    /// Flush anything buffered.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Authors file on disk.
///
/// Writes go through a `LineWriter`, so each record reaches the file as
/// soon as it is appended and partial progress survives a failed run.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| SvnmigError::SinkError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: LineWriter::new(file),
        })
    }

    /// Path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sink_error(&self, source: std::io::Error) -> SvnmigError {
        SvnmigError::SinkError {
            path: self.path.clone(),
            source,
        }
    }
}

impl AuthorSink for FileSink {
    fn append(&mut self, record: &AuthorRecord) -> Result<()> {
        writeln!(self.writer, "{}", record).map_err(|e| self.sink_error(e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| self.sink_error(e))
    }
}

/// In-memory sink whose contents stay readable after it is moved into a
/// consumer thread.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far, each including its trailing newline.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Everything written so far, concatenated.
    pub fn contents(&self) -> String {
        self.lines().concat()
    }
}

impl AuthorSink for MemorySink {
    fn append(&mut self, record: &AuthorRecord) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{}\n", record));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_uses_domain() {
        let record = AuthorRecord::new("alice", "example.com");
        assert_eq!(record.to_string(), "alice = alice <alice@example.com>");
    }

    #[test]
    fn file_sink_writes_one_line_per_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("authors.txt");

        let mut sink = FileSink::create(&path).unwrap();
        sink.append(&AuthorRecord::new("alice", "example.com")).unwrap();
        sink.append(&AuthorRecord::new("bob", "example.com")).unwrap();

        // Visible before flush: LineWriter flushes on newline.
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "alice = alice <alice@example.com>\nbob = bob <bob@example.com>\n"
        );
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn file_sink_truncates_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("authors.txt");
        std::fs::write(&path, "stale = stale <stale@old.com>\n").unwrap();

        let mut sink = FileSink::create(&path).unwrap();
        sink.append(&AuthorRecord::new("alice", "foo.com")).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "alice = alice <alice@foo.com>\n");
    }

    #[test]
    fn file_sink_in_missing_directory_is_sink_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("authors.txt");

        let err = FileSink::create(&path).unwrap_err();
        assert!(matches!(err, SvnmigError::SinkError { .. }));
    }

    #[test]
    fn memory_sink_shares_contents_across_clones() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer
            .append(&AuthorRecord::new("alice", "example.com"))
            .unwrap();
        assert_eq!(sink.contents(), "alice = alice <alice@example.com>\n");
    }
}
