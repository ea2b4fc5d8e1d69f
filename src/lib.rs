//! # csv2avro
//!
//! A **schema-driven converter** from delimited text to Avro object container
//! files. An Avro record schema decides how every text column is typed,
//! whether it may be empty, and where it lands in the output record.
//!
//! ## Key Features
//!
//! - **Positional or header-based mapping** - columns follow schema order, or
//!   are matched by name against a header row or an explicit name list
//! - **Typed coercion** - string, int, long, float, double and boolean fields,
//!   parsed locale-invariantly
//! - **Nullability from the schema** - `["T", "null"]` unions accept empty
//!   values as null; plain types reject them
//! - **Fail fast** - the first bad row stops the run with the value, field and
//!   target type in the error; no partial record ever reaches the output
//! - **Compressed input** - gzip, zstd, bzip2 and xz inputs are decoded
//!   transparently (optional via feature flags)
//!
//! ## Quick Start
//!
//! ```no_run
//! use csv2avro::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = Schema::from_path("employee.avsc")?;
//! let sink = AvroSink::create(&schema, "employee.avro", WriteMode::Create, default_codec())?;
//!
//! let stats = Converter::new(&schema, sink)
//!     .convert_file("employee.csv", &CsvOptions::default())?;
//! println!("{} rows written", stats.rows_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Row at a Time
//!
//! ```no_run
//! use csv2avro::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = Schema::parse_str(r#"{
//!     "type": "record", "name": "Employee",
//!     "fields": [
//!         { "name": "name", "type": "string" },
//!         { "name": "age", "type": ["int", "null"] }
//!     ]
//! }"#)?;
//! let mut session = AvroConverter::create(&schema, "out.avro", WriteMode::Create, default_codec())?;
//!
//! session.set_header(["age", "name"])?;
//! session.append(&["34", "Lee"])?;
//! session.append_line(",Sam", b',')?;
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. [`schema`] flattens the Avro record schema into typed, nullable fields
//! 2. [`resolver`] maps each column index to a field, by position or by name
//! 3. [`coerce`] parses raw text into typed values and audits nulls
//! 4. [`convert`] drives a row source into a [`RecordSink`], one row at a time
//! 5. [`io`] provides the CSV row source and the Avro sink
//!
//! ## Feature Flags
//!
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`,
//!   `compression-xz` - decode compressed input files

pub mod coerce;
pub mod config;
pub mod convert;
pub mod error;
pub mod io;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod testing;

pub use coerce::{audit_nulls, build_record, coerce};
pub use convert::{convert, ConversionStats, Converter, RawRow, RecordSink};
pub use error::{ConvertError, Result, SinkError};
pub use io::avro::{
    default_codec, parse_codec, read_avro_vec, AvroRecordReader, AvroSink, WriteMode,
};
pub use io::csv::{parse_line, CsvOptions, CsvRowSource, HeaderSource};
pub use record::{Record, Value};
pub use resolver::{resolve, HeaderMapping};
pub use schema::{Field, FieldKind, Schema, TypeSpec};

pub use apache_avro::Codec;

/// A session writing to an Avro container file.
pub type AvroConverter<'s> = Converter<'s, AvroSink<'s, std::io::BufWriter<std::fs::File>>>;
