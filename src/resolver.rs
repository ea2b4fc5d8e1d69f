//! Column-to-field resolution.
//!
//! Without a header mapping, column `i` targets the schema field at position
//! `i`. With a header mapping, column `i` targets the field named by header
//! entry `i`; a name that matches no field is skipped rather than rejected, so
//! extra input columns can simply be ignored.

use crate::error::{ConvertError, Result};
use crate::schema::{Field, Schema};
use log::{debug, warn};

/// Ordered column names aligned with incoming rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    names: Vec<String>,
}

impl HeaderMapping {
    /// Validate and build a header mapping.
    ///
    /// The list must be non-empty and every name must be non-blank with no
    /// leading or trailing whitespace. Names are matched exactly.
    ///
    /// # Errors
    /// Returns [`ConvertError::Configuration`] if the list is empty or any name
    /// is blank or padded with whitespace.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConvertError::Configuration(
                "header mapping must contain at least one column name".into(),
            ));
        }
        for (index, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConvertError::Configuration(format!(
                    "header column {index} has a blank name"
                )));
            }
            if name.trim() != name {
                return Err(ConvertError::Configuration(format!(
                    "header column {index} ('{name}') has leading or trailing whitespace"
                )));
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Header columns that name no field in `schema`, with their indices.
    pub fn unmatched<'a>(&'a self, schema: &Schema) -> Vec<(usize, &'a str)> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, name)| schema.field_by_name(name).is_none())
            .map(|(i, name)| (i, name.as_str()))
            .collect()
    }

    /// Check the mapping against a schema before conversion starts.
    ///
    /// Unmatched columns are logged and tolerated unless `strict` is set, in
    /// which case the first one is reported as [`ConvertError::UnknownColumn`].
    ///
    /// # Errors
    /// See above.
    pub fn check_against(&self, schema: &Schema, strict: bool) -> Result<()> {
        let unmatched = self.unmatched(schema);
        if let Some(&(index, name)) = unmatched.first() {
            if strict {
                return Err(ConvertError::UnknownColumn {
                    name: name.to_string(),
                    index,
                });
            }
            let names: Vec<&str> = unmatched.iter().map(|(_, n)| *n).collect();
            warn!(
                "{} header column(s) not in schema {} will be ignored: {}",
                unmatched.len(),
                schema.name(),
                names.join(", ")
            );
        }
        debug!(
            "header mapping with {} columns resolved against {} schema fields",
            self.names.len(),
            schema.len()
        );
        Ok(())
    }
}

/// Find the field targeted by column `column`.
///
/// Returns `Ok(None)` when a header mapping is set and the column's name has
/// no matching field; the caller must leave that column out of the record.
///
/// # Errors
/// Returns [`ConvertError::IndexOutOfRange`] when positional mapping runs past
/// the schema's fields, or a header mapping has fewer names than the row has
/// columns.
pub fn resolve<'s>(
    schema: &'s Schema,
    header: Option<&HeaderMapping>,
    column: usize,
) -> Result<Option<&'s Field>> {
    match header {
        None => schema
            .field(column)
            .map(Some)
            .ok_or(ConvertError::IndexOutOfRange {
                index: column,
                available: schema.len(),
            }),
        Some(mapping) => {
            let name = mapping
                .names
                .get(column)
                .ok_or(ConvertError::IndexOutOfRange {
                    index: column,
                    available: mapping.len(),
                })?;
            Ok(schema.field_by_name(name))
        }
    }
}
