use anyhow::Result;
use csv2avro::testing::*;
use csv2avro::{ConvertError, FieldKind, Schema, TypeSpec};

#[test]
fn fields_keep_declaration_order() {
    let schema = cost_index_schema();

    let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        [
            "medicare_administrative_contractor",
            "locality_number",
            "locality_name",
            "pw_gpci",
            "pe_gpci",
            "mp_gpci"
        ]
    );
    for (i, field) in schema.fields().iter().enumerate() {
        assert_eq!(field.position(), i);
    }
}

#[test]
fn name_is_fully_qualified() {
    assert_eq!(employee_schema().name(), "dumond.lee.Employee");
    assert_eq!(cost_index_schema().name(), "com.leedumond.CostIndex");
}

#[test]
fn null_branch_position_does_not_matter() {
    let schema = all_types_schema();

    assert_eq!(
        schema.field_by_name("ns").map(|f| f.spec().clone()),
        Some(TypeSpec::Nullable(FieldKind::String))
    );
    assert_eq!(
        schema.field_by_name("nf").map(|f| f.spec().clone()),
        Some(TypeSpec::Nullable(FieldKind::Float))
    );
    assert_eq!(
        schema.field_by_name("d").map(|f| f.spec().clone()),
        Some(TypeSpec::Required(FieldKind::Double))
    );
}

#[test]
fn lookup_by_name_is_exact() {
    let schema = employee_schema();
    assert!(schema.field_by_name("age").is_some());
    assert!(schema.field_by_name("Age").is_none());
    assert!(schema.field_by_name(" age").is_none());
    assert!(schema.field(2).is_none());
}

#[test]
fn union_without_null_is_required() {
    let schema = schema_from(
        r#"{"type":"record","name":"R","fields":[{"name":"v","type":["int","string"]}]}"#,
    );
    let field = schema.field(0).expect("field");
    assert!(!field.is_nullable());
    assert!(!field.spec().kind().is_supported());
}

#[test]
fn blank_or_invalid_text_is_a_schema_error() {
    for text in ["", "   ", "{not json", r#"{"type":"record"}"#] {
        assert!(
            matches!(Schema::parse_str(text), Err(ConvertError::Schema(_))),
            "{text:?}"
        );
    }
}

#[test]
fn top_level_must_be_a_record() {
    let err = Schema::parse_str(r#""string""#).unwrap_err();
    assert!(matches!(err, ConvertError::Schema(_)));
    assert!(err.to_string().contains("record"));
}

#[test]
fn schema_loads_from_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write_file("employee.avsc", EMPLOYEE_SCHEMA)?;

    let schema = Schema::from_path(&path)?;

    assert_eq!(schema.len(), 2);
    assert!(!schema.is_empty());
    Ok(())
}

#[test]
fn missing_schema_file_is_an_io_error() -> Result<()> {
    let dir = TempDirPath::new()?;
    let err = Schema::from_path(dir.file_path("missing.avsc")).unwrap_err();
    assert!(matches!(err, ConvertError::Io(_)));
    assert!(err.to_string().contains("missing.avsc"));
    Ok(())
}
