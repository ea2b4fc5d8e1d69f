use anyhow::Result;
use csv2avro::testing::*;
use csv2avro::{convert, ConvertError, Converter, FieldKind, HeaderMapping, Value};

#[test]
fn positional_row_becomes_typed_record() -> Result<()> {
    let schema = employee_schema();
    let mut sink = MemorySink::new();

    let stats = convert(rows(&[&["Lee", "34"]]), &schema, None, &mut sink, 0)?;

    assert_eq!(stats.rows_written, 1);
    let record = &sink.records()[0];
    assert_eq!(record.get("name"), Some(&Value::String("Lee".into())));
    assert_eq!(record.get("age"), Some(&Value::Int(34)));
    Ok(())
}

#[test]
fn unparsable_value_aborts_with_context() {
    let schema = employee_schema();
    let mut sink = MemorySink::new();

    let err = convert(rows(&[&["Lee", "not-a-number"]]), &schema, None, &mut sink, 0).unwrap_err();

    match err {
        ConvertError::Coercion {
            value,
            field,
            target,
        } => {
            assert_eq!(value, "not-a-number");
            assert_eq!(field, "age");
            assert_eq!(target, FieldKind::Int);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.records().is_empty());
    assert!(sink.is_closed());
}

#[test]
fn coercion_message_names_value_field_and_type() {
    let schema = employee_schema();
    let mut sink = MemorySink::new();
    let err = convert(rows(&[&["Lee", "x"]]), &schema, None, &mut sink, 0).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("'x'"));
    assert!(msg.contains("'age'"));
    assert!(msg.contains("int"));
}

#[test]
fn empty_value_in_nullable_field_is_null() -> Result<()> {
    let schema = schema_from(
        r#"{"type":"record","name":"S","fields":[{"name":"score","type":["float","null"]}]}"#,
    );
    let mut sink = MemorySink::new();

    convert(rows(&[&[""]]), &schema, None, &mut sink, 0)?;

    assert_eq!(sink.records()[0].get("score"), Some(&Value::Null));
    Ok(())
}

#[test]
fn whitespace_in_required_field_is_rejected() {
    let schema =
        schema_from(r#"{"type":"record","name":"S","fields":[{"name":"score","type":"float"}]}"#);
    let mut sink = MemorySink::new();

    let err = convert(rows(&[&["   "]]), &schema, None, &mut sink, 0).unwrap_err();

    assert!(matches!(err, ConvertError::NullNotAllowed { field } if field == "score"));
    assert!(sink.records().is_empty());
}

#[test]
fn header_mapping_reorders_and_ignores_extra_columns() -> Result<()> {
    let schema = employee_schema();
    let header = HeaderMapping::new(["age", "name", "extra"])?;
    let mut sink = MemorySink::new();

    let stats = convert(
        rows(&[&["34", "Lee", "ignored"]]),
        &schema,
        Some(&header),
        &mut sink,
        0,
    )?;

    assert_eq!(stats.rows_written, 1);
    let record = &sink.records()[0];
    assert_eq!(record.len(), 2);
    assert_eq!(record.get("age"), Some(&Value::Int(34)));
    assert_eq!(record.get("name"), Some(&Value::String("Lee".into())));
    assert!(!record.contains("extra"));
    Ok(())
}

#[test]
fn skip_rows_discards_literal_header() -> Result<()> {
    let schema = employee_schema();
    let mut sink = MemorySink::new();

    let stats = convert(
        rows(&[&["name", "age"], &["Lee", "34"], &["Sam", "29"]]),
        &schema,
        None,
        &mut sink,
        1,
    )?;

    assert_eq!(stats.rows_read, 3);
    assert_eq!(stats.rows_skipped, 1);
    assert_eq!(stats.rows_written, 2);
    assert_eq!(sink.records()[0].get("name"), Some(&Value::String("Lee".into())));
    Ok(())
}

#[test]
fn skip_rows_beyond_source_writes_nothing() -> Result<()> {
    let schema = employee_schema();
    let mut sink = MemorySink::new();
    let stats = convert(rows(&[&["Lee", "34"]]), &schema, None, &mut sink, 5)?;
    assert_eq!(stats.rows_skipped, 1);
    assert_eq!(stats.rows_written, 0);
    Ok(())
}

#[test]
fn failure_keeps_only_rows_before_the_bad_one() {
    let schema = employee_schema();
    let mut sink = MemorySink::new();

    let result = convert(
        rows(&[&["Lee", "34"], &["Sam", "29"], &["Kim", ""], &["Ada", "41"]]),
        &schema,
        None,
        &mut sink,
        0,
    );

    assert!(matches!(result, Err(ConvertError::NullNotAllowed { .. })));
    assert_eq!(sink.records().len(), 2);
    assert_eq!(sink.close_calls(), 1);
}

#[test]
fn sink_failure_is_propagated_and_sink_still_closed() {
    let schema = employee_schema();
    let mut sink = MemorySink::failing_at(1);

    let err = convert(
        rows(&[&["Lee", "34"], &["Sam", "29"], &["Ada", "41"]]),
        &schema,
        None,
        &mut sink,
        0,
    )
    .unwrap_err();

    assert!(matches!(err, ConvertError::Sink(_)));
    assert_eq!(sink.records().len(), 1);
    assert!(sink.is_closed());
}

#[test]
fn source_error_aborts_run() {
    let schema = employee_schema();
    let mut sink = MemorySink::new();
    let mut source = rows(&[&["Lee", "34"]]);
    source.push(Err(ConvertError::Configuration("broken source".into())));
    source.extend(rows(&[&["Sam", "29"]]));

    let err = convert(source, &schema, None, &mut sink, 0).unwrap_err();

    assert!(matches!(err, ConvertError::Configuration(_)));
    assert_eq!(sink.records().len(), 1);
    assert!(sink.is_closed());
}

#[test]
fn positional_row_longer_than_schema_is_out_of_range() {
    let schema = employee_schema();
    let mut sink = MemorySink::new();

    let err = convert(rows(&[&["Lee", "34", "extra"]]), &schema, None, &mut sink, 0).unwrap_err();

    assert!(matches!(
        err,
        ConvertError::IndexOutOfRange {
            index: 2,
            available: 2
        }
    ));
}

#[test]
fn session_appends_rows_one_at_a_time() -> Result<()> {
    let schema = employee_schema();
    let mut session = Converter::new(&schema, MemorySink::new());

    session.append(&["Lee", "34"])?;
    session.append_line("Sam,29", b',')?;
    assert!(session.append(&["Kim", "old"]).is_err());

    assert_eq!(session.rows_written(), 2);
    assert_eq!(session.sink().records().len(), 2);
    assert_eq!(session.close()?, 2);
    Ok(())
}

#[test]
fn session_header_line_maps_by_name() -> Result<()> {
    let schema = employee_schema();
    let mut session = Converter::new(&schema, MemorySink::new());

    session.set_header_line("age|name", b'|')?;
    session.append_line("29|Sam", b'|')?;

    let record = &session.sink().records()[0];
    assert_eq!(record.get("age"), Some(&Value::Int(29)));
    assert_eq!(record.get("name"), Some(&Value::String("Sam".into())));
    Ok(())
}

#[test]
fn session_header_can_be_replaced() -> Result<()> {
    let schema = employee_schema();
    let mut session = Converter::new(&schema, MemorySink::new());

    session.set_header(["age", "name"])?;
    session.set_header(["name", "age"])?;
    session.append(&["Lee", "34"])?;

    assert_eq!(session.header().map(|h| h.len()), Some(2));
    assert_eq!(session.sink().records()[0].get("age"), Some(&Value::Int(34)));
    Ok(())
}

#[test]
fn session_blank_header_line_is_rejected() {
    let schema = employee_schema();
    let mut session = Converter::new(&schema, MemorySink::new());

    for line in ["", "  \n "] {
        let err = session.set_header_line(line, b',').unwrap_err();
        assert!(matches!(err, ConvertError::Configuration(_)));
    }
    assert!(session.header().is_none());
}

#[test]
fn session_strict_columns_rejects_unknown_header() {
    let schema = employee_schema();
    let mut session = Converter::new(&schema, MemorySink::new()).strict_columns(true);

    let err = session.set_header(["name", "age", "extra"]).unwrap_err();

    assert!(matches!(
        err,
        ConvertError::UnknownColumn { ref name, index: 2 } if name == "extra"
    ));
    assert!(session.header().is_none());
}

#[test]
fn session_convert_rows_counts_earlier_appends() -> Result<()> {
    let schema = employee_schema();
    let mut session = Converter::new(&schema, MemorySink::new());
    session.append(&["Lee", "34"])?;

    let stats = session.convert_rows(rows(&[&["Sam", "29"], &["Ada", "41"]]), 0)?;

    assert_eq!(stats.rows_written, 3);
    Ok(())
}

#[test]
fn independent_sessions_do_not_share_state() -> Result<()> {
    let employees = employee_schema();
    let costs = cost_index_schema();
    let mut a = Converter::new(&employees, MemorySink::new());
    let mut b = Converter::new(&costs, MemorySink::new());

    a.set_header(["age", "name"])?;
    b.append(&["01112", "05", "SAN FRANCISCO", "1.127", "1.488", ""])?;
    a.append(&["34", "Lee"])?;

    assert!(b.header().is_none());
    assert_eq!(a.sink().records()[0].get("age"), Some(&Value::Int(34)));
    assert_eq!(b.sink().records()[0].get("mp_gpci"), Some(&Value::Null));
    Ok(())
}
