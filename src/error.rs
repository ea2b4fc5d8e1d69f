//! Error kinds raised while mapping text rows onto a record schema.
//!
//! Every error on the coercion path is fatal to the row and to the run. The only
//! non-error outcome for a mismatch is a header column with no schema field,
//! which is skipped unless strict column matching is enabled.

use crate::schema::FieldKind;

/// Result alias used throughout the library.
pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// Errors that can occur while converting rows into records.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Invalid session configuration, e.g. an empty header mapping.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A column lies past the last schema field (positional mode) or the last
    /// header name (header mode).
    #[error("column {index} is out of range, only {available} columns can be mapped")]
    IndexOutOfRange { index: usize, available: usize },

    /// A header column names no schema field (strict column matching only).
    #[error("header column '{name}' at index {index} does not match any schema field")]
    UnknownColumn { name: String, index: usize },

    /// An empty or whitespace value was supplied for a non-nullable field.
    #[error("value of 'null' is not allowed for field '{field}'")]
    NullNotAllowed { field: String },

    /// A non-empty value could not be parsed into the field's type.
    #[error("value '{value}' of field '{field}' could not be converted to {target}")]
    Coercion {
        value: String,
        field: String,
        target: FieldKind,
    },

    /// The field's type is outside the supported primitives.
    #[error("type {kind} is not supported for field '{field}'")]
    UnsupportedType { field: String, kind: String },

    /// The whole-record audit found nulls in fields that do not allow them.
    #[error("fields hold null but the schema does not allow it: {}", .fields.join(", "))]
    InvalidNulls { fields: Vec<String> },

    /// The schema text or object could not be used.
    #[error("schema error: {0}")]
    Schema(String),

    /// The row source failed to produce a row.
    #[error("row source error: {0}")]
    Source(#[from] csv::Error),

    /// The sink rejected or failed an append or flush.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// An Avro container could not be read back.
    #[error("avro read error: {0}")]
    Avro(#[source] apache_avro::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by a [`RecordSink`](crate::convert::RecordSink).
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Encoding or container failure inside the Avro library.
    #[error("avro: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    /// A non-nullable field was absent from the record and declares no default.
    #[error("field '{0}' is missing from the record and has no default")]
    MissingField(String),

    /// An existing output file cannot be appended to.
    #[error("cannot append to {path}: {reason}")]
    Append { path: String, reason: String },

    /// The sink was used after `close`.
    #[error("sink is closed")]
    Closed,

    /// Failure injected or reported by a non-Avro sink.
    #[error("{0}")]
    Other(String),
}
