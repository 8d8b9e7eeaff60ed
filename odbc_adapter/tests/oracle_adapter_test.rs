use odbc_adapter::connection::CatalogColumn;
use odbc_adapter::schema::{ColumnDefinition, CreateTableOptions, DropTableOptions, TableDefinition};
use odbc_adapter::test_helpers::{RecordingConnection, RecordingHandle};
use odbc_adapter::{
    Adapter, AdapterConfig, AdapterError, ColumnType, DialectRegistry, ExecResult, Row,
    SavedRecord, Value,
};

fn oracle_adapter() -> (Adapter, RecordingHandle) {
    let _ = env_logger::builder().is_test(true).try_init();
    let conn = RecordingConnection::with_product_name("Oracle");
    let handle = conn.handle();
    let config = AdapterConfig::new()
        .with_driver("Oracle 21 ODBC driver")
        .with_username("scott");
    let adapter = Adapter::with_connection(config, Box::new(conn), &DialectRegistry::with_builtins())
        .expect("adapter should be created");
    assert_eq!(adapter.dialect_name(), "oracle");
    (adapter, handle)
}

fn people_catalog() -> Vec<CatalogColumn> {
    vec![
        CatalogColumn::new("ID", "NUMBER").precision(38, Some(0)).not_null(),
        CatalogColumn::new("NAME", "VARCHAR2").length(40),
        CatalogColumn::new("ACTIVE", "NUMBER").precision(1, None),
        CatalogColumn::new("CREATED_AT", "DATE").default_value("sysdate "),
        CatalogColumn::new("BIO", "CLOB"),
    ]
}

fn row<const N: usize>(fields: [(&str, Value); N]) -> Row {
    fields.into_iter().collect()
}

#[test]
fn test_insert_fetches_next_sequence_value() {
    let (mut adapter, handle) = oracle_adapter();
    handle.script_rows("nextval", vec![row([("ID", Value::Integer(10001))])]);

    let sql = "INSERT INTO people (id, name) VALUES (?, 'Ann')";
    let id = adapter
        .insert(sql, Some("Person Create"), Some("id"), None, None)
        .expect("insert");

    assert_eq!(id, Value::Integer(10001));
    assert_eq!(
        handle.statements(),
        vec!["select people_seq.nextval id from dual", sql]
    );
    assert_eq!(handle.id_inserts(), vec![(sql.to_string(), 10001)]);
}

#[test]
fn test_insert_with_explicit_sequence_name() {
    let (mut adapter, handle) = oracle_adapter();
    handle.script_rows("nextval", vec![row([("ID", Value::Integer(7))])]);

    let id = adapter
        .insert("INSERT INTO people (id) VALUES (?)", None, Some("id"), None, Some("ppl_seq"))
        .expect("insert");
    assert_eq!(id, Value::Integer(7));
    assert_eq!(
        handle.statements()[0],
        "select ppl_seq.nextval id from dual"
    );
}

#[test]
fn test_insert_with_supplied_id_runs_unmodified() {
    let (mut adapter, handle) = oracle_adapter();

    let sql = "INSERT INTO people (id, name) VALUES (42, 'Bob')";
    let id = adapter
        .insert(sql, None, Some("id"), Some(Value::Integer(42)), None)
        .expect("insert");
    assert_eq!(id, Value::Integer(42));

    let literal = "INSERT INTO people (id) VALUES (people_seq.nextval)";
    adapter
        .insert(
            literal,
            None,
            Some("id"),
            Some(Value::Literal("people_seq.nextval".into())),
            None,
        )
        .expect("insert");

    assert_eq!(handle.statements(), vec![sql, literal]);
    assert!(handle.id_inserts().is_empty());
}

#[test]
fn test_insert_without_sequence_value_fails() {
    let (mut adapter, _handle) = oracle_adapter();
    let result = adapter.insert("INSERT INTO people (id) VALUES (?)", None, Some("id"), None, None);
    assert!(matches!(result, Err(AdapterError::StatementInvalid(_))));
}

#[test]
fn test_paged_select_strips_row_number_column() {
    let (mut adapter, handle) = oracle_adapter();
    handle.script_rows(
        "raw_sql_",
        vec![row([
            ("ID", Value::Integer(11)),
            ("NAME", Value::from("Ann")),
            ("RAW_RNUM_", Value::Integer(11)),
        ])],
    );

    let sql = adapter.add_limit_offset("SELECT * FROM people;", Some(10), Some(10));
    assert!(sql.contains("where rownum <= 20"));
    let rows = adapter.select(&sql, None).expect("select");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "name"]);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Ann")));
}

#[test]
fn test_distinct_with_order_keeps_alias_out_of_results() {
    let (mut adapter, handle) = oracle_adapter();
    let select = format!(
        "SELECT {} FROM posts",
        adapter.distinct("posts.id", "posts.created_at DESC")
    );
    let sql = adapter.add_order_by_for_association_limiting(&select, "posts.created_at DESC");
    assert!(sql.contains("AS alias_0__"));
    assert!(sql.ends_with("ORDER BY alias_0__ DESC"));

    handle.script_rows(
        "from posts",
        vec![row([("ID", Value::Integer(3)), ("ALIAS_0__", Value::from("2024-01-01"))])],
    );
    let rows = adapter.select_rows(&sql, None).expect("select");
    assert_eq!(rows, vec![vec![Value::Integer(3)]]);
}

#[test]
fn test_execute_routes_by_statement_kind() {
    let (mut adapter, handle) = oracle_adapter();
    handle.set_affected(4);

    assert!(adapter
        .execute("  (select * from dual)", None)
        .expect("query")
        .is_query());
    assert_eq!(
        adapter.execute("UPDATE people SET name = 'x'", None).expect("update"),
        ExecResult::Affected(4)
    );
}

#[test]
fn test_columns_use_username_schema_and_skip_cache() {
    let (mut adapter, handle) = oracle_adapter();
    handle.set_columns("PEOPLE", people_catalog());
    handle.set_primary_keys("PEOPLE", vec!["ID"]);

    let columns = adapter.columns("people", None).expect("columns");
    adapter.columns("people", None).expect("columns");

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "active", "created_at", "bio"]);

    let types: Vec<ColumnType> = columns.iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        vec![
            ColumnType::Integer,
            ColumnType::String,
            ColumnType::Boolean,
            ColumnType::DateTime,
            ColumnType::Text,
        ]
    );
    assert!(columns[0].primary);
    assert!(!columns[0].null);
    assert_eq!(columns[1].limit, Some(40));
    assert_eq!(columns[3].default, None);

    let column_calls: Vec<String> = handle
        .catalog_calls()
        .into_iter()
        .filter(|c| c.starts_with("columns"))
        .collect();
    assert_eq!(column_calls, vec!["columns:people:SCOTT", "columns:people:SCOTT"]);
}

#[test]
fn test_create_table_creates_sequence_after_table() {
    let (mut adapter, handle) = oracle_adapter();
    let table = TableDefinition::new("people")
        .column(ColumnDefinition::new("name", ColumnType::String).limit(40))
        .column(ColumnDefinition::new("active", ColumnType::Boolean).default_value(true));

    adapter
        .create_table(&table, &CreateTableOptions::default())
        .expect("create table");

    assert_eq!(
        handle.statements(),
        vec![
            "CREATE TABLE people (id NUMBER(38) NOT NULL PRIMARY KEY, name VARCHAR2(40), active NUMBER(1) DEFAULT 1)",
            "CREATE SEQUENCE people_seq START WITH 10000",
        ]
    );
}

#[test]
fn test_create_table_with_long_sequence_name_runs_nothing() {
    let (mut adapter, handle) = oracle_adapter();
    let table = TableDefinition::new("customer_order_line_item_notes")
        .column(ColumnDefinition::new("qty", ColumnType::Integer));

    let result = adapter.create_table(&table, &CreateTableOptions::default().force());
    match result {
        Err(AdapterError::StatementInvalid(msg)) => {
            assert_eq!(msg, "name customer_order_line_item_notes_seq too long")
        }
        other => panic!("expected StatementInvalid, got {:?}", other),
    }
    assert!(handle.statements().is_empty());
}

#[test]
fn test_forced_create_table_ignores_failed_drop() {
    let (mut adapter, handle) = oracle_adapter();
    handle.fail_on("drop table");
    let table = TableDefinition::new("t").column(ColumnDefinition::new("a", ColumnType::Integer));

    adapter
        .create_table(&table, &CreateTableOptions::default().force())
        .expect("create table");
    assert_eq!(
        handle.statements(),
        vec![
            "DROP TABLE t",
            "DROP SEQUENCE t_seq",
            "CREATE TABLE t (id NUMBER(38) NOT NULL PRIMARY KEY, a NUMBER(38))",
            "CREATE SEQUENCE t_seq START WITH 10000",
        ]
    );
}

#[test]
fn test_drop_and_rename_table_swallow_sequence_failures() {
    let (mut adapter, handle) = oracle_adapter();
    handle.fail_on("sequence");
    handle.fail_on("_seq to");

    adapter
        .drop_table("people", &DropTableOptions::default())
        .expect("drop table");
    adapter.rename_table("people", "persons").expect("rename table");

    assert_eq!(
        handle.statements(),
        vec![
            "DROP TABLE people",
            "DROP SEQUENCE people_seq",
            "RENAME people TO persons",
            "RENAME people_seq TO persons_seq",
        ]
    );
}

#[test]
fn test_drop_table_failure_propagates() {
    let (mut adapter, handle) = oracle_adapter();
    handle.fail_on("drop table");
    let result = adapter.drop_table("people", &DropTableOptions::default());
    assert!(result.is_err());
    assert_eq!(handle.statements(), vec!["DROP TABLE people"]);
}

#[test]
fn test_recreate_database_drops_every_table() {
    let (mut adapter, handle) = oracle_adapter();
    handle.set_tables(vec!["PEOPLE", "ORDERS"]);

    adapter.recreate_database("xe").expect("recreate");
    assert_eq!(
        handle.statements(),
        vec![
            "DROP TABLE people",
            "DROP SEQUENCE people_seq",
            "DROP TABLE orders",
            "DROP SEQUENCE orders_seq",
        ]
    );
}

#[test]
fn test_insert_fixture_casts_quotes_and_writes_lobs() {
    let (mut adapter, handle) = oracle_adapter();
    handle.set_columns("PEOPLE", people_catalog());
    handle.set_primary_keys("PEOPLE", vec!["ID"]);

    let fixture = row([
        ("id", Value::from("1")),
        ("name", Value::from("O'Neil")),
        ("active", Value::Bool(true)),
        ("bio", Value::from("A long biography")),
    ]);
    adapter.insert_fixture(&fixture, "people").expect("fixture");

    assert_eq!(
        handle.last_statement().as_deref(),
        Some("INSERT INTO people (id, name, active, bio) VALUES (1, 'O''Neil', 1, empty_clob())")
    );
    let lobs = handle.lob_writes();
    assert_eq!(lobs.len(), 1);
    assert_eq!(lobs[0].table, "people");
    assert_eq!(lobs[0].column, "bio");
    assert_eq!(lobs[0].primary_key, "id");
    assert_eq!(lobs[0].id, "1");
    assert!(!lobs[0].binary);
    assert_eq!(lobs[0].value, Value::from("A long biography"));
}

#[test]
fn test_after_save_skips_blank_lobs() {
    let (mut adapter, handle) = oracle_adapter();
    handle.set_columns("PEOPLE", people_catalog());
    handle.set_primary_keys("PEOPLE", vec!["ID"]);
    let columns = adapter.columns("people", None).expect("columns");

    let record = SavedRecord::new("people", "id", 5i64)
        .with_columns(columns)
        .with_values(row([("bio", Value::from(""))]));
    adapter.after_save(&record).expect("hooks");
    assert!(handle.lob_writes().is_empty());
}

#[test]
fn test_current_database_and_validation() {
    let (mut adapter, handle) = oracle_adapter();
    handle.script_rows("sys_context", vec![row([("DB", Value::from("XE"))])]);

    assert_eq!(adapter.current_database().expect("db").as_deref(), Some("XE"));
    adapter.validate().expect("validate");
    assert_eq!(handle.last_statement().as_deref(), Some("SELECT 1 FROM DUAL"));
}

#[test]
fn test_native_types_follow_oracle_overrides() {
    let (adapter, _) = oracle_adapter();
    assert_eq!(
        adapter.native_database_types().primary_key(),
        "NUMBER(38) NOT NULL PRIMARY KEY"
    );
    assert_eq!(
        adapter.native_sql_to_type("NUMBER(38) NOT NULL PRIMARY KEY"),
        (Some(ColumnType::PrimaryKey), None)
    );
    assert_eq!(
        adapter.native_sql_to_type("VARCHAR2(255)"),
        (Some(ColumnType::String), Some(255))
    );
    assert_eq!(
        adapter.native_sql_to_type("NUMBER(38)"),
        (Some(ColumnType::Integer), Some(38))
    );
    assert_eq!(
        adapter.native_sql_to_type("NUMBER(1)"),
        (Some(ColumnType::Boolean), Some(1))
    );
    assert_eq!(adapter.native_sql_to_type("FOO(3)"), (None, None));
    assert_eq!(adapter.native_sql_to_type("%%"), (Some(ColumnType::String), Some(255)));
    assert_eq!(adapter.table_alias_length(), 30);
}

#[test]
fn test_boolean_columns_agree_with_type_table() {
    let (mut adapter, handle) = oracle_adapter();
    handle.set_columns("flags", vec![CatalogColumn::new("ENABLED", "NUMBER").precision(1, None)]);

    let columns = adapter.columns("flags", None).expect("columns");
    assert_eq!(columns[0].column_type, ColumnType::Boolean);

    let declaration = adapter
        .type_to_sql(ColumnType::Boolean, None, None, None)
        .expect("declaration");
    assert_eq!(declaration, "NUMBER(1)");
    assert_eq!(
        adapter.native_sql_to_type(&declaration).0,
        Some(columns[0].column_type)
    );
}
