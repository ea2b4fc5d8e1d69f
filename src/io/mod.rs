//! Input and output collaborators of the conversion engine.
//!
//! - [`csv`] - delimited text row source and line tokenizer
//! - [`avro`] - Avro container sink and reader
//! - [`compression`] - transparent decompression of input files

pub mod avro;
pub mod compression;
pub mod csv;

use crate::error::ConvertError;
use std::path::Path;

/// Annotate an I/O error with the action and path that caused it.
pub(crate) fn io_context(e: std::io::Error, action: &str, path: &Path) -> ConvertError {
    ConvertError::Io(std::io::Error::new(
        e.kind(),
        format!("{action} {}: {e}", path.display()),
    ))
}
