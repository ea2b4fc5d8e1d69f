//! Delimited text input.
//!
//! This module provides:
//! - **Row source**: [`CsvRowSource`] yields raw string rows from a file, one at
//!   a time, never holding more than the current row
//! - **Line parsing**: [`parse_line`] tokenizes a single line with the same
//!   quoting rules, for row-at-a-time appends
//!
//! # Design notes
//! - The tokenizer never consumes a header itself. Whether the first row is a
//!   header is decided by the conversion session.
//! - Rows may differ in length; mapping decides what a short or long row means.
//! - Values are not trimmed. Blank lines produce no row.

use crate::convert::RawRow;
use crate::error::{ConvertError, Result};
use crate::io::compression::auto_detect_reader;
use crate::io::io_context;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Where a file's header mapping comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderSource {
    /// Columns map to schema fields by position.
    None,
    /// The first row (after skipped rows) names the columns.
    #[default]
    FirstRow,
}

/// Tokenizer and session options for reading a delimited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub quote: u8,
    /// Leading rows to discard before anything else is read.
    pub skip_rows: usize,
    pub header: HeaderSource,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            skip_rows: 0,
            header: HeaderSource::FirstRow,
        }
    }
}

impl CsvOptions {
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn skip_rows(mut self, n: usize) -> Self {
        self.skip_rows = n;
        self
    }

    #[must_use]
    pub fn header(mut self, header: HeaderSource) -> Self {
        self.header = header;
        self
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .trim(Trim::None)
            .delimiter(self.delimiter)
            .quote(self.quote);
        builder
    }
}

/// Lazy, forward-only source of raw rows.
pub struct CsvRowSource {
    reader: csv::Reader<Box<dyn Read>>,
    record: StringRecord,
}

impl CsvRowSource {
    /// Open a delimited file, decompressing it transparently if needed.
    ///
    /// # Errors
    /// Returns [`ConvertError::Io`] if the file cannot be opened or its
    /// compression cannot be set up.
    pub fn open(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| io_context(e, "open", path))?;
        let rdr = auto_detect_reader(f, path)
            .map_err(|e| io_context(e, "setup decompression for", path))?;
        debug!(
            "reading {} with delimiter {:?}",
            path.display(),
            options.delimiter as char
        );
        Ok(Self::from_reader(rdr, options))
    }

    /// Wrap any reader, e.g. standard input or an in-memory buffer.
    pub fn from_reader(reader: impl Read + 'static, options: &CsvOptions) -> Self {
        let reader: Box<dyn Read> = Box::new(reader);
        Self {
            reader: options.reader_builder().from_reader(reader),
            record: StringRecord::new(),
        }
    }
}

impl Iterator for CsvRowSource {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self.record.iter().map(str::to_string).collect())),
            Ok(false) => None,
            Err(e) => Some(Err(ConvertError::Source(e))),
        }
    }
}

/// Tokenize one line of delimited text.
///
/// A blank line yields an empty row.
///
/// # Errors
/// Returns [`ConvertError::Source`] if the line is malformed.
pub fn parse_line(line: &str, delimiter: u8) -> Result<RawRow> {
    let mut reader = CsvOptions::default()
        .delimiter(delimiter)
        .reader_builder()
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record.iter().map(str::to_string).collect())
    } else {
        Ok(Vec::new())
    }
}
