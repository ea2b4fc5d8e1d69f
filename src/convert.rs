//! Conversion driver and the caller-owned conversion session.
//!
//! The driver pulls rows one at a time from a forward-only source, builds a
//! record per row, and appends it to a [`RecordSink`]. The first failure stops
//! the run; the sink is closed on every exit path.
//!
//! ```
//! use csv2avro::convert::convert;
//! use csv2avro::testing::{employee_schema, rows, MemorySink};
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = employee_schema();
//! let mut sink = MemorySink::new();
//! let stats = convert(
//!     rows(&[&["name", "age"], &["Lee", "34"], &["Sam", "29"]]),
//!     &schema,
//!     None,
//!     &mut sink,
//!     1,
//! )?;
//! assert_eq!(stats.rows_written, 2);
//! assert!(sink.is_closed());
//! # Ok(())
//! # }
//! ```

use crate::coerce::build_record;
use crate::error::{ConvertError, Result, SinkError};
use crate::io::csv::{parse_line, CsvOptions, CsvRowSource, HeaderSource};
use crate::record::Record;
use crate::resolver::HeaderMapping;
use crate::schema::Schema;
use log::{debug, error, info, warn};
use std::path::Path;

/// Destination for accepted records.
///
/// Implementations own their encoding and durability. After `close` returns,
/// further appends must fail with [`SinkError::Closed`].
pub trait RecordSink {
    /// Encode and append one complete record.
    fn append(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Flush buffered records and release the underlying resource.
    fn close(&mut self) -> Result<(), SinkError>;
}

/// One raw row as produced by a row source.
pub type RawRow = Vec<String>;

/// Counters for a finished conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Rows pulled from the source, skipped and header rows included.
    pub rows_read: u64,
    /// Leading rows discarded without coercion.
    pub rows_skipped: u64,
    /// Rows successfully appended to the sink.
    pub rows_written: u64,
}

/// Convert every row of `rows` into records appended to `sink`.
///
/// The first `skip_rows` rows are discarded unread. The sink is closed before
/// returning, whether the run succeeded or not; on failure the original error
/// is returned unchanged.
///
/// # Errors
/// The first source, resolution, coercion, audit, or sink error.
pub fn convert<I, S>(
    rows: I,
    schema: &Schema,
    header: Option<&HeaderMapping>,
    sink: &mut S,
    skip_rows: usize,
) -> Result<ConversionStats>
where
    I: IntoIterator<Item = Result<RawRow>>,
    S: RecordSink + ?Sized,
{
    let mut stats = ConversionStats::default();
    let outcome = drive(rows, schema, header, sink, skip_rows, &mut stats);
    let closed = sink.close();
    match (outcome, closed) {
        (Ok(()), Ok(())) => {
            info!(
                "converted {} rows into {} ({} read, {} skipped)",
                stats.rows_written,
                schema.name(),
                stats.rows_read,
                stats.rows_skipped
            );
            Ok(stats)
        }
        (Ok(()), Err(e)) => Err(e.into()),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                warn!("closing sink after failed conversion: {close_err}");
            }
            Err(e)
        }
    }
}

fn drive<I, S>(
    rows: I,
    schema: &Schema,
    header: Option<&HeaderMapping>,
    sink: &mut S,
    skip_rows: usize,
    stats: &mut ConversionStats,
) -> Result<()>
where
    I: IntoIterator<Item = Result<RawRow>>,
    S: RecordSink + ?Sized,
{
    for row in rows {
        stats.rows_read += 1;
        let row_number = stats.rows_read;
        let row = row.inspect_err(|e| error!("row {row_number}: {e}"))?;
        if stats.rows_skipped < skip_rows as u64 {
            stats.rows_skipped += 1;
            debug!("skipping row {row_number}");
            continue;
        }
        let record = build_record(schema, header, row.as_slice())
            .inspect_err(|e| error!("row {row_number}: {e}"))?;
        sink.append(&record)
            .map_err(ConvertError::from)
            .inspect_err(|e| error!("row {row_number}: {e}"))?;
        stats.rows_written += 1;
    }
    Ok(())
}

/// A conversion session: one schema, an optional header mapping, one sink.
///
/// Rows may be appended one at a time with [`append`](Converter::append) or a
/// whole source converted with [`convert_rows`](Converter::convert_rows) or
/// [`convert_file`](Converter::convert_file). Sessions hold no shared state,
/// so independent sessions can run side by side.
pub struct Converter<'s, S: RecordSink> {
    schema: &'s Schema,
    header: Option<HeaderMapping>,
    sink: S,
    strict_columns: bool,
    rows_written: u64,
}

impl<'s, S: RecordSink> Converter<'s, S> {
    pub fn new(schema: &'s Schema, sink: S) -> Self {
        Self {
            schema,
            header: None,
            sink,
            strict_columns: false,
            rows_written: 0,
        }
    }

    /// Reject header columns that match no schema field instead of skipping
    /// them. Applies to mappings set after this call.
    #[must_use]
    pub fn strict_columns(mut self, strict: bool) -> Self {
        self.strict_columns = strict;
        self
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn header(&self) -> Option<&HeaderMapping> {
        self.header.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Rows appended so far in this session.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Map columns by name from now on, replacing any earlier mapping.
    ///
    /// # Errors
    /// [`ConvertError::Configuration`] for an empty list or blank names;
    /// [`ConvertError::UnknownColumn`] for an unmatched name in strict mode.
    pub fn set_header<I, T>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mapping = HeaderMapping::new(names)?;
        mapping.check_against(self.schema, self.strict_columns)?;
        self.header = Some(mapping);
        Ok(())
    }

    /// Like [`set_header`](Converter::set_header), taking one delimited line.
    ///
    /// # Errors
    /// [`ConvertError::Configuration`] for a blank line, otherwise as
    /// [`set_header`](Converter::set_header).
    pub fn set_header_line(&mut self, line: &str, delimiter: u8) -> Result<()> {
        if line.trim().is_empty() {
            return Err(ConvertError::Configuration(
                "header line must not be blank".into(),
            ));
        }
        self.set_header(parse_line(line, delimiter)?)
    }

    /// Coerce one row and append it to the sink.
    ///
    /// # Errors
    /// Any resolution, coercion, audit, or sink error; nothing is appended.
    pub fn append<T: AsRef<str>>(&mut self, row: &[T]) -> Result<()> {
        let record = build_record(self.schema, self.header.as_ref(), row)?;
        self.sink.append(&record)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Append one delimited line of text.
    ///
    /// # Errors
    /// See [`append`](Converter::append).
    pub fn append_line(&mut self, line: &str, delimiter: u8) -> Result<()> {
        let row = parse_line(line, delimiter)?;
        self.append(row.as_slice())
    }

    /// Convert a whole row source and close the session.
    ///
    /// # Errors
    /// See [`convert`].
    pub fn convert_rows<I>(mut self, rows: I, skip_rows: usize) -> Result<ConversionStats>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        let mut stats = convert(
            rows,
            self.schema,
            self.header.as_ref(),
            &mut self.sink,
            skip_rows,
        )?;
        stats.rows_written += self.rows_written;
        Ok(stats)
    }

    /// Convert a delimited text file and close the session.
    ///
    /// With [`HeaderSource::FirstRow`], the first row left after `skip_rows`
    /// becomes the header mapping unless one was already set.
    ///
    /// # Errors
    /// Opening or reading the file, an invalid header row, or any row error.
    pub fn convert_file(
        mut self,
        path: impl AsRef<Path>,
        options: &CsvOptions,
    ) -> Result<ConversionStats> {
        let path = path.as_ref();
        info!("converting {} into {}", path.display(), self.schema.name());
        let source = match CsvRowSource::open(path, options) {
            Ok(source) => source,
            Err(e) => {
                self.release();
                return Err(e);
            }
        };

        if options.header != HeaderSource::FirstRow || self.header.is_some() {
            return self.convert_rows(source, options.skip_rows);
        }

        let mut rows = source.into_iter();
        let mut preamble = ConversionStats::default();
        let header = loop {
            match rows.next() {
                Some(Ok(_)) if preamble.rows_skipped < options.skip_rows as u64 => {
                    preamble.rows_read += 1;
                    preamble.rows_skipped += 1;
                }
                Some(Ok(row)) => {
                    preamble.rows_read += 1;
                    break Some(row);
                }
                Some(Err(e)) => {
                    self.release();
                    return Err(e);
                }
                None => break None,
            }
        };
        match header {
            Some(names) => {
                if let Err(e) = self.set_header(names) {
                    self.release();
                    return Err(e);
                }
            }
            None => debug!("{} has no header row", path.display()),
        }

        let mut stats = self.convert_rows(rows, 0)?;
        stats.rows_read += preamble.rows_read;
        stats.rows_skipped += preamble.rows_skipped;
        Ok(stats)
    }

    /// Flush and release the sink, returning the number of rows appended.
    ///
    /// # Errors
    /// The sink's close failure.
    pub fn close(mut self) -> Result<u64> {
        self.sink.close()?;
        info!("closed session for {} after {} rows", self.schema.name(), self.rows_written);
        Ok(self.rows_written)
    }

    fn release(&mut self) {
        if let Err(e) = self.sink.close() {
            warn!("closing sink after failed conversion: {e}");
        }
    }
}
