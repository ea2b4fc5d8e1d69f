//! Text-to-value coercion and record assembly.
//!
//! [`build_record`] turns one raw row into a [`Record`]: each column is
//! resolved to a field, blank text becomes null where the field allows it, and
//! anything else is parsed into the field's primitive. The finished record is
//! then audited so that no null ever reaches a non-nullable field.
//!
//! Parsing is locale-invariant. Numeric and boolean text may carry surrounding
//! whitespace, string values are kept verbatim.

use crate::error::{ConvertError, Result};
use crate::record::{Record, Value};
use crate::resolver::{resolve, HeaderMapping};
use crate::schema::{Field, FieldKind, Schema};

/// Whether raw text counts as "no value".
#[inline]
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

/// Coerce one raw value into `field`'s type.
///
/// # Errors
/// * [`ConvertError::NullNotAllowed`] for blank text on a non-nullable field.
/// * [`ConvertError::Coercion`] when the text does not parse.
/// * [`ConvertError::UnsupportedType`] for non-blank text on a field whose type
///   is not one of the six primitives.
pub fn coerce(field: &Field, raw: &str) -> Result<Value> {
    if is_blank(raw) {
        return if field.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(ConvertError::NullNotAllowed {
                field: field.name().to_string(),
            })
        };
    }

    let kind = field.spec().kind();
    let parse_err = || ConvertError::Coercion {
        value: raw.to_string(),
        field: field.name().to_string(),
        target: kind.clone(),
    };
    let text = raw.trim();

    match kind {
        FieldKind::String => Ok(Value::String(raw.to_string())),
        FieldKind::Int => text.parse().map(Value::Int).map_err(|_| parse_err()),
        FieldKind::Long => text.parse().map(Value::Long).map_err(|_| parse_err()),
        FieldKind::Float => match text.parse::<f32>() {
            Ok(v) if !overflowed(v.is_infinite(), text) => Ok(Value::Float(v)),
            _ => Err(parse_err()),
        },
        FieldKind::Double => match text.parse::<f64>() {
            Ok(v) if !overflowed(v.is_infinite(), text) => Ok(Value::Double(v)),
            _ => Err(parse_err()),
        },
        FieldKind::Boolean => parse_bool(text).map(Value::Boolean).ok_or_else(parse_err),
        FieldKind::Unsupported(desc) => Err(ConvertError::UnsupportedType {
            field: field.name().to_string(),
            kind: desc.clone(),
        }),
    }
}

/// A finite literal that parsed to infinity is out of range for its type.
fn overflowed(infinite: bool, text: &str) -> bool {
    infinite && !text.to_ascii_lowercase().contains("inf")
}

/// Boolean literals are case-sensitive: `true`/`false` and `True`/`False`.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" => Some(true),
        "false" | "False" => Some(false),
        _ => None,
    }
}

/// Build a complete record from one raw row.
///
/// Columns whose header name matches no field are left out of the record.
/// Fields the row never reaches are absent, not null.
///
/// # Errors
/// Fails on the first column that cannot be resolved or coerced, or if the
/// final null audit rejects the record. No partial record is returned.
pub fn build_record<S: AsRef<str>>(
    schema: &Schema,
    header: Option<&HeaderMapping>,
    row: &[S],
) -> Result<Record> {
    let mut record = Record::with_capacity(row.len());
    for (column, raw) in row.iter().enumerate() {
        let Some(field) = resolve(schema, header, column)? else {
            continue;
        };
        let value = coerce(field, raw.as_ref())?;
        record.put(field.name(), value);
    }
    audit_nulls(schema, &record)?;
    Ok(record)
}

/// Verify that every schema field holding an explicit null permits it.
///
/// Fields absent from the record are not checked.
///
/// # Errors
/// Returns [`ConvertError::InvalidNulls`] naming every offending field.
pub fn audit_nulls(schema: &Schema, record: &Record) -> Result<()> {
    let invalid: Vec<String> = schema
        .fields()
        .iter()
        .filter(|f| !f.is_nullable())
        .filter(|f| record.get(f.name()).is_some_and(Value::is_null))
        .map(|f| f.name().to_string())
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::InvalidNulls { fields: invalid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeSpec;

    fn field(kind: FieldKind, nullable: bool) -> Field {
        let spec = if nullable {
            TypeSpec::Nullable(kind)
        } else {
            TypeSpec::Required(kind)
        };
        Field::new("f", spec, 0)
    }

    #[test]
    fn numeric_text_may_be_padded() {
        let f = field(FieldKind::Int, false);
        assert_eq!(coerce(&f, " 42 ").unwrap(), Value::Int(42));
    }

    #[test]
    fn int_overflow_is_a_coercion_error() {
        let f = field(FieldKind::Int, false);
        let err = coerce(&f, "2147483648").unwrap_err();
        assert!(matches!(err, ConvertError::Coercion { .. }));
    }

    #[test]
    fn long_accepts_values_beyond_int() {
        let f = field(FieldKind::Long, false);
        assert_eq!(
            coerce(&f, "2147483648").unwrap(),
            Value::Long(2_147_483_648)
        );
    }

    #[test]
    fn float_overflow_is_a_coercion_error() {
        let f = field(FieldKind::Float, false);
        assert!(matches!(
            coerce(&f, "1e40").unwrap_err(),
            ConvertError::Coercion { .. }
        ));
        assert!(coerce(&f, "-3.5e38").is_err());
        assert_eq!(coerce(&f, "3.4e38").unwrap(), Value::Float(3.4e38));
        assert_eq!(coerce(&f, "inf").unwrap(), Value::Float(f32::INFINITY));
    }

    #[test]
    fn double_overflow_is_a_coercion_error() {
        let d = field(FieldKind::Double, true);
        assert!(matches!(
            coerce(&d, "1e400").unwrap_err(),
            ConvertError::Coercion { .. }
        ));
        assert_eq!(coerce(&d, "1e40").unwrap(), Value::Double(1e40));
        assert_eq!(
            coerce(&d, "-Infinity").unwrap(),
            Value::Double(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn boolean_literals_are_case_sensitive() {
        let f = field(FieldKind::Boolean, false);
        assert_eq!(coerce(&f, "True").unwrap(), Value::Boolean(true));
        assert_eq!(coerce(&f, "false").unwrap(), Value::Boolean(false));
        assert!(coerce(&f, "TRUE").is_err());
        assert!(coerce(&f, "1").is_err());
    }

    #[test]
    fn strings_are_not_trimmed() {
        let f = field(FieldKind::String, false);
        assert_eq!(coerce(&f, "  a b ").unwrap(), Value::String("  a b ".into()));
    }

    #[test]
    fn blank_on_unsupported_nullable_is_null() {
        let f = field(FieldKind::Unsupported("array".into()), true);
        assert_eq!(coerce(&f, "").unwrap(), Value::Null);
        assert!(matches!(
            coerce(&f, "[1]").unwrap_err(),
            ConvertError::UnsupportedType { .. }
        ));
    }
}
