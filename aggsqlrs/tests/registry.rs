//! Integration tests for loading stored requests from disk.

use std::fs;

use aggsql::registry::NamedRequest;
use aggsql::{
    AggregateBuilder, AggregateRequest, AggsqlError, AxisIncrement, DatabaseType, Line, Role,
    RequestRegistry, Slot,
};

const AXIS_YAML: &str = r#"
name: events_by_year
description: Event count per year
axis:
  start_date: "'2001-01-01'"
  end_date: "'2010-01-01'"
  increment: Year
lines:
  - { text: "EventDate", slot: select, role: axis }
  - { text: "COUNT(*) AS MyCount", slot: select, role: count_function }
  - { text: "testTable", slot: from }
  - { text: "EventDate", slot: group_by, role: axis }
"#;

const PLAIN_JSON: &str = r#"{
  "name": "by_category",
  "lines": [
    { "text": "COUNT(*) AS MyCount", "slot": "select" },
    { "text": "Category AS Cat", "slot": "select" },
    { "text": "testTable", "slot": "from" },
    { "text": "Category", "slot": "group_by" }
  ]
}"#;

#[test]
fn loads_yaml_and_json_requests() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("axis.yml"), AXIS_YAML).unwrap();
    fs::write(dir.path().join("plain.json"), PLAIN_JSON).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a request").unwrap();

    let registry = RequestRegistry::load_from_dir(dir.path()).unwrap();
    assert_eq!(registry.names(), vec!["by_category", "events_by_year"]);

    let axis = registry.get("events_by_year").unwrap();
    let spec = axis.axis.as_ref().unwrap();
    assert_eq!(spec.increment, AxisIncrement::Year);
    assert_eq!(spec.start_date, "'2001-01-01'");
    assert_eq!(axis.axis_select().unwrap().text, "EventDate");
    assert_eq!(axis.axis_group_by().unwrap().slot, Slot::GroupBy);

    let plain = registry.get("by_category").unwrap();
    assert!(plain.axis.is_none());
    assert!(plain.lines.iter().all(|l| l.role == Role::None));
    assert_eq!(
        registry.requests["events_by_year"].description.as_deref(),
        Some("Event count per year")
    );
}

#[test]
fn loaded_request_builds_sql() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("axis.yaml"), AXIS_YAML).unwrap();
    let registry = RequestRegistry::load_from_dir(dir.path()).unwrap();

    let sql = AggregateBuilder::default()
        .build(DatabaseType::PostgreSql, registry.get("events_by_year").unwrap())
        .unwrap();
    assert!(sql.contains("generate_series("));
    assert!(sql.contains("LEFT JOIN ("));
}

#[test]
fn missing_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = RequestRegistry::load_from_dir(dir.path().join("nope")).unwrap_err();
    match err {
        AggsqlError::InvalidRequest(msg) => assert!(msg.contains("requests directory not found")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unknown_increment_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("weekly.yml"),
        AXIS_YAML.replace("increment: Year", "increment: Week"),
    )
    .unwrap();
    let err = RequestRegistry::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, AggsqlError::Yaml(_)), "{err:?}");
}

#[test]
fn duplicate_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.yml"), AXIS_YAML).unwrap();
    fs::write(dir.path().join("b.yml"), AXIS_YAML).unwrap();
    let err = RequestRegistry::load_from_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("defined more than once"));
}

#[test]
fn from_parts_indexes_by_name() {
    let registry = RequestRegistry::from_parts(vec![NamedRequest {
        name: "inline".to_string(),
        description: None,
        request: AggregateRequest::new(vec![Line::select("1 AS one")]),
    }]);
    assert_eq!(registry.names(), vec!["inline"]);
    assert!(registry.get("missing").is_none());
}
