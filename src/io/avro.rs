//! Avro container output and read-back.
//!
//! [`AvroSink`] is the [`RecordSink`] that encodes records into an Avro object
//! container file. [`AvroRecordReader`] reads such a file back into
//! [`Record`]s.
//!
//! # Design notes
//! - Record values are laid out in schema field order. Nullable fields are
//!   encoded as the matching union branch.
//! - A field the record never received takes its declared default, or null if
//!   it is nullable. Otherwise the append fails with
//!   [`SinkError::MissingField`].
//! - Append mode reuses the existing file's sync marker and block codec, so
//!   the result is a single valid container whatever codec was requested.

use crate::convert::{Converter, RecordSink};
use crate::error::{ConvertError, Result, SinkError};
use crate::io::io_context;
use crate::record::{Record, Value};
use crate::schema::Schema;
use apache_avro::types::Value as AvroValue;
use apache_avro::{Codec, Writer};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// How an existing output file is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Create the file, truncating any previous content.
    #[default]
    Create,
    /// Add blocks to an existing container written with the same schema.
    Append,
}

/// Parse a codec name (`null`, `deflate`, and any other codec the Avro
/// library was built with).
///
/// # Errors
/// Returns [`ConvertError::Configuration`] for an unknown name.
pub fn parse_codec(name: &str) -> Result<Codec> {
    Codec::from_str(&name.to_ascii_lowercase())
        .map_err(|e| ConvertError::Configuration(format!("unknown codec '{name}': {e:?}")))
}

/// Default codec for new files.
pub fn default_codec() -> Codec {
    Codec::from_str("deflate").unwrap_or(Codec::Null)
}

/// Record sink writing an Avro object container.
pub struct AvroSink<'s, W: Write> {
    schema: &'s Schema,
    writer: Option<Writer<'s, W>>,
    appended: u64,
}

impl<'s, W: Write> AvroSink<'s, W> {
    /// Start a new container on `out`.
    pub fn new(schema: &'s Schema, out: W, codec: Codec) -> Self {
        Self {
            schema,
            writer: Some(Writer::with_codec(schema.avro(), out, codec)),
            appended: 0,
        }
    }

    /// Continue an existing container on `out`, whose header ended with
    /// `marker`.
    pub fn append_to(schema: &'s Schema, out: W, codec: Codec, marker: [u8; 16]) -> Self {
        Self {
            schema,
            writer: Some(Writer::append_to_with_codec(
                schema.avro(),
                out,
                codec,
                marker,
            )),
            appended: 0,
        }
    }

    /// Records appended through this sink.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Close the container and hand back the underlying writer.
    ///
    /// # Errors
    /// Returns [`SinkError::Closed`] if the sink was already closed, or the
    /// flush failure.
    pub fn into_inner(mut self) -> Result<W, SinkError> {
        let writer = self.writer.take().ok_or(SinkError::Closed)?;
        let mut out = writer.into_inner()?;
        out.flush()?;
        Ok(out)
    }
}

impl<'s> AvroSink<'s, BufWriter<File>> {
    /// Open `path` for writing in the given mode.
    ///
    /// Parent directories are created as needed. Appending to a missing or
    /// empty file starts a new container. Appended blocks always use the
    /// codec recorded in the existing file, whatever `codec` asks for.
    ///
    /// # Errors
    /// I/O failures, or [`SinkError::Append`] when the existing file is not an
    /// Avro container with the same schema.
    pub fn create(
        schema: &'s Schema,
        path: impl AsRef<Path>,
        mode: WriteMode,
        codec: Codec,
    ) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).map_err(|e| io_context(e, "mkdir -p", parent))?;
        }

        let existing_len = match mode {
            WriteMode::Append => std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            WriteMode::Create => 0,
        };
        if existing_len == 0 {
            let f = File::create(path).map_err(|e| io_context(e, "create", path))?;
            info!("writing {} to {}", schema.name(), path.display());
            return Ok(Self::new(schema, BufWriter::new(f), codec));
        }

        let (marker, file_codec) = existing_container(schema, path)?;
        if std::mem::discriminant(&file_codec) != std::mem::discriminant(&codec) {
            warn!(
                "{} was written with codec {file_codec:?}, appending with it instead of {codec:?}",
                path.display()
            );
        }
        let f = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| io_context(e, "open", path))?;
        info!("appending {} to {}", schema.name(), path.display());
        Ok(Self::append_to(schema, BufWriter::new(f), file_codec, marker))
    }
}

impl<'s> Converter<'s, AvroSink<'s, BufWriter<File>>> {
    /// Open a session that writes `path`. See [`AvroSink::create`].
    ///
    /// # Errors
    /// See [`AvroSink::create`].
    pub fn create(
        schema: &'s Schema,
        path: impl AsRef<Path>,
        mode: WriteMode,
        codec: Codec,
    ) -> Result<Self> {
        let sink = AvroSink::create(schema, path, mode, codec)?;
        Ok(Converter::new(schema, sink))
    }
}

impl<W: Write> RecordSink for AvroSink<'_, W> {
    fn append(&mut self, record: &Record) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        let value = to_avro_value(record, self.schema.avro())?;
        writer.append(value)?;
        self.appended += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let mut out = writer.into_inner()?;
        out.flush()?;
        debug!("closed avro sink after {} records", self.appended);
        Ok(())
    }
}

impl<W: Write> Drop for AvroSink<'_, W> {
    fn drop(&mut self) {
        if self.writer.is_some()
            && let Err(e) = self.close()
        {
            warn!("flushing avro sink on drop: {e}");
        }
    }
}

/// Validate an existing container against `schema` and read its sync marker
/// and block codec.
fn existing_container(schema: &Schema, path: &Path) -> Result<([u8; 16], Codec)> {
    let bytes = std::fs::read(path).map_err(|e| io_context(e, "read", path))?;
    let append_err = |reason: String| {
        ConvertError::Sink(SinkError::Append {
            path: path.display().to_string(),
            reason,
        })
    };
    let reader = apache_avro::Reader::new(bytes.as_slice())
        .map_err(|e| append_err(format!("not an avro container: {e}")))?;
    if reader.writer_schema() != schema.avro() {
        return Err(append_err(format!(
            "file schema differs from {}",
            schema.name()
        )));
    }
    if bytes.len() <= 16 {
        return Err(append_err("file is too short to hold a sync marker".into()));
    }
    let codec = header_codec(&bytes).map_err(append_err)?;
    Ok((apache_avro::read_marker(&bytes), codec))
}

/// The codec named by a container header's `avro.codec` entry. A header
/// without one uses `null`.
fn header_codec(bytes: &[u8]) -> std::result::Result<Codec, String> {
    let mut rest = bytes
        .strip_prefix(b"Obj\x01")
        .ok_or("missing container magic")?;
    let meta_schema = apache_avro::Schema::parse_str(r#"{"type":"map","values":"bytes"}"#)
        .map_err(|e| e.to_string())?;
    let meta = apache_avro::from_avro_datum(&meta_schema, &mut rest, None)
        .map_err(|e| format!("unreadable header metadata: {e}"))?;
    let AvroValue::Map(entries) = meta else {
        return Err("header metadata is not a map".into());
    };
    match entries.get("avro.codec") {
        None => Ok(Codec::Null),
        Some(AvroValue::Bytes(name)) => {
            parse_codec(&String::from_utf8_lossy(name)).map_err(|e| e.to_string())
        }
        Some(other) => Err(format!("unexpected avro.codec entry {other:?}")),
    }
}

/// Lay out `record` as an Avro record value for `schema`.
///
/// # Errors
/// [`SinkError::MissingField`] for an absent non-nullable field without a
/// default; [`SinkError::Avro`] if a default cannot be resolved.
pub fn to_avro_value(record: &Record, schema: &apache_avro::Schema) -> Result<AvroValue, SinkError> {
    let apache_avro::Schema::Record(record_schema) = schema else {
        return Err(SinkError::Other("sink schema is not a record".into()));
    };
    let mut fields = Vec::with_capacity(record_schema.fields.len());
    for field in &record_schema.fields {
        let value = match record.get(&field.name) {
            Some(value) => encode_field(value, &field.schema),
            None => match &field.default {
                Some(default) => AvroValue::from(default.clone()).resolve(&field.schema)?,
                None if is_nullable(&field.schema) => encode_field(&Value::Null, &field.schema),
                None => return Err(SinkError::MissingField(field.name.clone())),
            },
        };
        fields.push((field.name.clone(), value));
    }
    Ok(AvroValue::Record(fields))
}

fn is_nullable(schema: &apache_avro::Schema) -> bool {
    match schema {
        apache_avro::Schema::Union(union) => union
            .variants()
            .iter()
            .any(|v| matches!(v, apache_avro::Schema::Null)),
        _ => false,
    }
}

fn encode_field(value: &Value, schema: &apache_avro::Schema) -> AvroValue {
    let plain = plain_value(value);
    let apache_avro::Schema::Union(union) = schema else {
        return plain;
    };
    let branch = union.variants().iter().position(|v| {
        matches!(v, apache_avro::Schema::Null) == value.is_null()
    });
    match branch {
        Some(i) => AvroValue::Union(i as u32, Box::new(plain)),
        // let the writer's validation report the mismatch
        None => plain,
    }
}

fn plain_value(value: &Value) -> AvroValue {
    match value {
        Value::Null => AvroValue::Null,
        Value::String(s) => AvroValue::String(s.clone()),
        Value::Int(v) => AvroValue::Int(*v),
        Value::Long(v) => AvroValue::Long(*v),
        Value::Float(v) => AvroValue::Float(*v),
        Value::Double(v) => AvroValue::Double(*v),
        Value::Boolean(v) => AvroValue::Boolean(*v),
    }
}

/// Reads an Avro container back into [`Record`]s.
pub struct AvroRecordReader<R: Read> {
    reader: apache_avro::Reader<'static, R>,
}

impl AvroRecordReader<BufReader<File>> {
    /// Open an Avro container file.
    ///
    /// # Errors
    /// I/O failures or a malformed container header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| io_context(e, "open", path))?;
        Self::new(BufReader::new(f))
    }
}

impl<R: Read> AvroRecordReader<R> {
    /// # Errors
    /// Returns [`ConvertError::Avro`] if the header cannot be read.
    pub fn new(input: R) -> Result<Self> {
        let reader = apache_avro::Reader::new(input).map_err(ConvertError::Avro)?;
        Ok(Self { reader })
    }

    /// The schema the file was written with.
    pub fn writer_schema(&self) -> &apache_avro::Schema {
        self.reader.writer_schema()
    }
}

impl<R: Read> Iterator for AvroRecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.reader.next()?;
        Some(value.map_err(ConvertError::Avro).and_then(from_avro_record))
    }
}

/// Read every record of an Avro container file.
///
/// # Errors
/// See [`AvroRecordReader`].
pub fn read_avro_vec(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    AvroRecordReader::open(path)?.collect()
}

fn from_avro_record(value: AvroValue) -> Result<Record> {
    let AvroValue::Record(fields) = value else {
        return Err(ConvertError::Schema(
            "container does not hold records".into(),
        ));
    };
    fields
        .into_iter()
        .map(|(name, v)| {
            let value = from_avro_value(&name, v)?;
            Ok((name, value))
        })
        .collect()
}

fn from_avro_value(field: &str, value: AvroValue) -> Result<Value> {
    Ok(match value {
        AvroValue::Null => Value::Null,
        AvroValue::String(s) => Value::String(s),
        AvroValue::Int(v) => Value::Int(v),
        AvroValue::Long(v) => Value::Long(v),
        AvroValue::Float(v) => Value::Float(v),
        AvroValue::Double(v) => Value::Double(v),
        AvroValue::Boolean(v) => Value::Boolean(v),
        AvroValue::Union(_, inner) => from_avro_value(field, *inner)?,
        other => {
            return Err(ConvertError::UnsupportedType {
                field: field.to_string(),
                kind: format!("{other:?}"),
            });
        }
    })
}
