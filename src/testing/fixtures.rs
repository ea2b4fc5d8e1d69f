//! Pre-built schemas and rows for common testing scenarios.

use crate::convert::RawRow;
use crate::error::Result;
use crate::schema::Schema;

/// `Employee { name: string, age: int }`.
pub const EMPLOYEE_SCHEMA: &str = r#"{
   "type" : "record",
   "namespace" : "dumond.lee",
   "name" : "Employee",
   "fields" : [
      { "name" : "name" , "type" : "string" },
      { "name" : "age" , "type" : "int" }
   ]
}"#;

/// Geographic practice cost index rows, with one nullable float column.
pub const COST_INDEX_SCHEMA: &str = r#"{
  "namespace": "com.leedumond",
  "type": "record",
  "name": "CostIndex",
  "fields": [
    { "name": "medicare_administrative_contractor", "type": "string" },
    { "name": "locality_number", "type": "string" },
    { "name": "locality_name", "type": "string" },
    { "name": "pw_gpci", "type": "float" },
    { "name": "pe_gpci", "type": "float" },
    { "name": "mp_gpci", "type": ["float", "null"] }
  ]
}"#;

/// One required and one nullable field of every supported primitive.
pub const ALL_TYPES_SCHEMA: &str = r#"{
  "type": "record",
  "name": "AllTypes",
  "fields": [
    { "name": "s", "type": "string" },
    { "name": "i", "type": "int" },
    { "name": "l", "type": "long" },
    { "name": "f", "type": "float" },
    { "name": "d", "type": "double" },
    { "name": "b", "type": "boolean" },
    { "name": "ns", "type": ["null", "string"] },
    { "name": "ni", "type": ["null", "int"] },
    { "name": "nl", "type": ["null", "long"] },
    { "name": "nf", "type": ["float", "null"] },
    { "name": "nd", "type": ["double", "null"] },
    { "name": "nb", "type": ["boolean", "null"] }
  ]
}"#;

/// Parse a fixture schema.
///
/// # Panics
///
/// Panics if `json` is not a valid record schema.
#[must_use]
pub fn schema_from(json: &str) -> Schema {
    Schema::parse_str(json).expect("fixture schema must parse")
}

/// See [`EMPLOYEE_SCHEMA`].
#[must_use]
pub fn employee_schema() -> Schema {
    schema_from(EMPLOYEE_SCHEMA)
}

/// See [`COST_INDEX_SCHEMA`].
#[must_use]
pub fn cost_index_schema() -> Schema {
    schema_from(COST_INDEX_SCHEMA)
}

/// See [`ALL_TYPES_SCHEMA`].
#[must_use]
pub fn all_types_schema() -> Schema {
    schema_from(ALL_TYPES_SCHEMA)
}

/// Turn string literals into a row source.
///
/// # Example
///
/// ```
/// use csv2avro::testing::rows;
///
/// let source = rows(&[&["Lee", "34"], &["Sam", "29"]]);
/// assert_eq!(source.len(), 2);
/// ```
#[must_use]
pub fn rows(data: &[&[&str]]) -> Vec<Result<RawRow>> {
    data.iter()
        .map(|row| Ok(row.iter().map(|s| (*s).to_string()).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_schemas_parse() {
        assert_eq!(employee_schema().len(), 2);
        assert_eq!(cost_index_schema().len(), 6);
        assert_eq!(all_types_schema().len(), 12);
    }

    #[test]
    fn test_cost_index_nullability() {
        let schema = cost_index_schema();
        let nullable: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| f.is_nullable())
            .map(|f| f.name())
            .collect();
        assert_eq!(nullable, vec!["mp_gpci"]);
    }
}
