//! Typed records produced from text rows.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::Long(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Boolean(v) => serializer.serialize_bool(*v),
        }
    }
}

/// Field values keyed by name, in the order they were assigned.
///
/// A field that never received a value is absent, which is distinct from a
/// field holding [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
            index: HashMap::with_capacity(n),
        }
    }

    /// Assign `value` to `name`, replacing any earlier assignment.
    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.fields[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.fields.len());
                self.fields.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&slot| &self.fields[slot].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.put(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_replaces_in_place() {
        let mut record = Record::new();
        record.put("a", Value::Int(1));
        record.put("b", Value::Null);
        record.put("a", Value::Int(2));

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&Value::Int(2)));
        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn wide_records_resolve_every_field() {
        let record: Record = (0..500)
            .map(|i| (format!("c{i}"), Value::Long(i)))
            .collect();

        assert_eq!(record.len(), 500);
        assert_eq!(record.get("c0"), Some(&Value::Long(0)));
        assert_eq!(record.get("c499"), Some(&Value::Long(499)));
        assert!(!record.contains("c500"));
    }
}
