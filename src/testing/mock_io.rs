//! Mock I/O helpers for testing without real output files.

use crate::convert::RecordSink;
use crate::error::SinkError;
use crate::record::Record;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// In-memory sink that keeps every appended record.
///
/// Use [`MemorySink::failing_at`] to make the n-th append (0-based) fail, which
/// simulates a sink error in the middle of a run.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<Record>,
    fail_at: Option<usize>,
    attempts: usize,
    closed: bool,
    close_calls: usize,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose append number `n` (0-based) fails.
    #[must_use]
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    /// Records accepted so far.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many times `close` was called.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &Record) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_at == Some(attempt) {
            return Err(SinkError::Other(format!("injected failure at append {attempt}")));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        self.close_calls += 1;
        Ok(())
    }
}

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A file path within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }

    /// Write `contents` to `filename` in this directory and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_file(&self, filename: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.file_path(filename);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    #[test]
    fn test_memory_sink_injected_failure() {
        let mut sink = MemorySink::failing_at(1);
        let record: Record = [("a", Value::Int(1))].into_iter().collect();
        assert!(sink.append(&record).is_ok());
        assert!(sink.append(&record).is_err());
        assert!(sink.append(&record).is_ok());
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn test_memory_sink_rejects_after_close() {
        let mut sink = MemorySink::new();
        sink.close().unwrap();
        assert!(matches!(
            sink.append(&Record::new()),
            Err(SinkError::Closed)
        ));
    }

    #[test]
    fn test_temp_dir_write_file() {
        let dir = TempDirPath::new().unwrap();
        let path = dir.write_file("rows.csv", "a,b\n").unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a,b\n");
    }
}
