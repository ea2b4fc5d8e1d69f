//! Record schemas as seen by the coercion engine.
//!
//! An Avro record schema is parsed once and flattened into an ordered list of
//! [`Field`]s. Each field carries a [`TypeSpec`] that is decided at load time:
//! either a required primitive or a nullable union wrapping one primitive. The
//! per-row engine never inspects Avro union variants again.
//!
//! ```
//! use csv2avro::schema::{FieldKind, Schema};
//!
//! let schema = Schema::parse_str(r#"{
//!     "type": "record",
//!     "name": "Employee",
//!     "fields": [
//!         { "name": "name", "type": "string" },
//!         { "name": "score", "type": ["float", "null"] }
//!     ]
//! }"#).unwrap();
//!
//! let score = schema.field_by_name("score").unwrap();
//! assert_eq!(score.spec().kind(), &FieldKind::Float);
//! assert!(score.is_nullable());
//! ```

use crate::error::{ConvertError, Result};
use crate::io::io_context;
use apache_avro::schema::{SchemaKind, UnionSchema};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// The primitive a field's raw text is coerced into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    Boolean,
    /// Any other declared type; carries a description for diagnostics.
    Unsupported(String),
}

impl FieldKind {
    fn from_avro(schema: &apache_avro::Schema) -> Self {
        use apache_avro::Schema as S;
        match schema {
            S::String => FieldKind::String,
            S::Int => FieldKind::Int,
            S::Long => FieldKind::Long,
            S::Float => FieldKind::Float,
            S::Double => FieldKind::Double,
            S::Boolean => FieldKind::Boolean,
            other => FieldKind::Unsupported(describe(other)),
        }
    }

    /// Whether values of this kind can be produced from text.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldKind::Unsupported(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => f.write_str("string"),
            FieldKind::Int => f.write_str("int (32-bit integer)"),
            FieldKind::Long => f.write_str("long (64-bit integer)"),
            FieldKind::Float => f.write_str("float (32-bit float)"),
            FieldKind::Double => f.write_str("double (64-bit float)"),
            FieldKind::Boolean => f.write_str("boolean"),
            FieldKind::Unsupported(desc) => f.write_str(desc),
        }
    }
}

/// A field's declared type after union analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// A plain type; null is never accepted.
    Required(FieldKind),
    /// A union of one type with `null`.
    Nullable(FieldKind),
}

impl TypeSpec {
    /// Decide the type spec for a field's Avro schema.
    ///
    /// A union is nullable iff one of its branches is `null`. A nullable union
    /// with more than one non-null branch is kept nullable but its kind is
    /// unsupported, so empty values still map to null while any text fails.
    #[must_use]
    pub fn from_avro(schema: &apache_avro::Schema) -> Self {
        match schema {
            apache_avro::Schema::Union(union) => Self::from_union(union),
            other => TypeSpec::Required(FieldKind::from_avro(other)),
        }
    }

    fn from_union(union: &UnionSchema) -> Self {
        let variants = union.variants();
        let nullable = variants
            .iter()
            .any(|v| matches!(v, apache_avro::Schema::Null));
        let non_null: Vec<&apache_avro::Schema> = variants
            .iter()
            .filter(|v| !matches!(v, apache_avro::Schema::Null))
            .collect();
        let kind = match non_null.as_slice() {
            [single] if nullable => FieldKind::from_avro(single),
            _ => FieldKind::Unsupported(format!(
                "union [{}]",
                variants.iter().map(describe).collect::<Vec<_>>().join(", ")
            )),
        };
        if nullable {
            TypeSpec::Nullable(kind)
        } else {
            TypeSpec::Required(kind)
        }
    }

    /// The effective primitive of the field.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        match self {
            TypeSpec::Required(k) | TypeSpec::Nullable(k) => k,
        }
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeSpec::Nullable(_))
    }
}

/// One named, typed, positioned slot in a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    spec: TypeSpec,
    position: usize,
}

impl Field {
    pub fn new(name: impl Into<String>, spec: TypeSpec, position: usize) -> Self {
        Self {
            name: name.into(),
            spec,
            position,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &TypeSpec {
        &self.spec
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_nullable(&self) -> bool {
        self.spec.is_nullable()
    }
}

/// A parsed record schema: ordered fields plus the Avro schema they came from.
///
/// Field order is the schema's declaration order and drives positional
/// column mapping. The schema is read-only once built.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    lookup: HashMap<String, usize>,
    avro: apache_avro::Schema,
}

impl Schema {
    /// Parse Avro schema JSON text. The top-level type must be a record.
    ///
    /// # Errors
    /// Returns [`ConvertError::Schema`] for blank text, invalid JSON, an invalid
    /// Avro schema, or a non-record top-level type.
    pub fn parse_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(ConvertError::Schema("schema text is empty".into()));
        }
        let avro = apache_avro::Schema::parse_str(text)
            .map_err(|e| ConvertError::Schema(e.to_string()))?;
        Self::from_avro(avro)
    }

    /// Read and parse an Avro schema file (`.avsc`).
    ///
    /// # Errors
    /// Returns [`ConvertError::Io`] if the file cannot be read, otherwise see
    /// [`Schema::parse_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| io_context(e, "read schema", path))?;
        Self::parse_str(&text)
    }

    /// Build from an already parsed Avro schema.
    ///
    /// # Errors
    /// Returns [`ConvertError::Schema`] if the schema is not a record.
    pub fn from_avro(avro: apache_avro::Schema) -> Result<Self> {
        let apache_avro::Schema::Record(record) = &avro else {
            return Err(ConvertError::Schema(format!(
                "top-level schema must be a record, found {}",
                describe(&avro)
            )));
        };
        let name = record.name.fullname(None);
        let mut fields = Vec::with_capacity(record.fields.len());
        let mut lookup = HashMap::with_capacity(record.fields.len());
        for (position, rf) in record.fields.iter().enumerate() {
            lookup.insert(rf.name.clone(), position);
            fields.push(Field::new(
                rf.name.clone(),
                TypeSpec::from_avro(&rf.schema),
                position,
            ));
        }
        Ok(Self {
            name,
            fields,
            lookup,
            avro,
        })
    }

    /// Fully qualified record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, position: usize) -> Option<&Field> {
        self.fields.get(position)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.lookup.get(name).map(|&i| &self.fields[i])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The underlying Avro schema, as handed to the container writer.
    pub fn avro(&self) -> &apache_avro::Schema {
        &self.avro
    }
}

fn describe(schema: &apache_avro::Schema) -> String {
    format!("{:?}", SchemaKind::from(schema)).to_lowercase()
}
