//! TOML configuration for repeatable conversions.
//!
//! Instead of passing many CLI flags, settings can live in a config file:
//!
//! ```toml
//! # csv2avro.toml
//! [conversion]
//! delimiter = "|"
//! skip_rows = 2
//! header = "first-row"
//! codec = "deflate"
//! mode = "append"
//! strict_columns = true
//! ```
//!
//! Command-line flags take precedence over file values.

use crate::io::avro::WriteMode;
use crate::io::csv::{CsvOptions, HeaderSource};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure for `csv2avro.toml` files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Settings for the convert command.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    /// Single-character field delimiter (default `,`).
    pub delimiter: Option<String>,

    /// Single-character quote (default `"`).
    pub quote: Option<String>,

    /// Leading rows to discard.
    pub skip_rows: Option<usize>,

    /// Where column names come from.
    pub header: Option<HeaderSource>,

    /// Explicit column names; takes precedence over `header`.
    pub header_names: Option<Vec<String>>,

    /// Avro block codec (`null`, `deflate`).
    pub codec: Option<String>,

    pub mode: Option<WriteMode>,

    /// Fail on header columns missing from the schema.
    pub strict_columns: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or does not parse, see
    /// [`Config::parse`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Fails on invalid TOML, unknown keys, or values of the wrong type.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

impl ConversionConfig {
    /// Tokenizer options from these settings, defaults filling the gaps.
    ///
    /// An explicit `header_names` list implies the file has no header row of
    /// its own to consume.
    ///
    /// # Errors
    /// Fails if `delimiter` or `quote` is not a single ASCII character.
    pub fn csv_options(&self) -> Result<CsvOptions> {
        let mut options = CsvOptions::default();
        if let Some(d) = &self.delimiter {
            options.delimiter = single_byte("delimiter", d)?;
        }
        if let Some(q) = &self.quote {
            options.quote = single_byte("quote", q)?;
        }
        if let Some(n) = self.skip_rows {
            options.skip_rows = n;
        }
        if let Some(h) = self.header {
            options.header = h;
        }
        if self.header_names.is_some() {
            options.header = HeaderSource::None;
        }
        Ok(options)
    }
}

/// Parse a one-character ASCII setting such as a delimiter.
///
/// # Errors
/// Fails unless `value` is one ASCII character, `\t`, or `tab`.
pub fn single_byte(setting: &str, value: &str) -> Result<u8> {
    let value = match value {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => bail!("{setting} must be a single ASCII character, got {value:?}"),
    }
}
