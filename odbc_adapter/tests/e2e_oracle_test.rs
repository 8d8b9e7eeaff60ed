mod helpers;
use helpers::e2e::should_run_e2e_tests;
use helpers::oracle_config;
use odbc_adapter::schema::{ColumnDefinition, CreateTableOptions, DropTableOptions, TableDefinition};
use chrono::NaiveDate;
use odbc_adapter::{Adapter, ColumnType, DialectRegistry, Value};
use serial_test::serial;

const TABLE: &str = "odbc_adapter_e2e";

fn connect() -> Adapter {
    let config = oracle_config().expect("ORACLE_TEST_DSN");
    let adapter = Adapter::connect(config, &DialectRegistry::with_builtins()).expect("connect");
    assert_eq!(adapter.dialect_name(), "oracle");
    adapter
}

fn create_people(adapter: &mut Adapter) {
    let table = TableDefinition::new(TABLE)
        .column(ColumnDefinition::new("name", ColumnType::String).limit(40))
        .column(ColumnDefinition::new("bio", ColumnType::Text))
        .column(ColumnDefinition::new("active", ColumnType::Boolean).default_value(true));
    adapter
        .create_table(&table, &CreateTableOptions::default().force())
        .expect("create table");
}

#[test]
#[serial]
fn test_oracle_sequence_insert_and_paging() {
    if !should_run_e2e_tests() {
        eprintln!("⚠️  Skipping E2E test: Oracle not available");
        return;
    }

    let mut adapter = connect();
    create_people(&mut adapter);

    let sql = format!("INSERT INTO {} (id, name) VALUES (?, 'Ann')", TABLE);
    let first = adapter
        .insert(&sql, None, Some("id"), None, None)
        .expect("insert");
    let second = adapter
        .insert(&sql, None, Some("id"), None, None)
        .expect("insert");
    let (Some(first), Some(second)) = (first.as_i64(), second.as_i64()) else {
        panic!("sequence ids should be integers");
    };
    assert_eq!(first, 10000);
    assert_eq!(second, first + 1);

    let paged = adapter.add_limit_offset(
        &format!("SELECT id, name FROM {} ORDER BY id", TABLE),
        Some(1),
        Some(1),
    );
    let rows = adapter.select(&paged, None).expect("select");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "name"]);
    assert_eq!(rows[0].get("id").and_then(Value::as_i64), Some(second));

    adapter
        .drop_table(TABLE, &DropTableOptions::default())
        .expect("drop table");
}

#[test]
#[serial]
fn test_oracle_columns_and_structure_dump() {
    if !should_run_e2e_tests() {
        eprintln!("⚠️  Skipping E2E test: Oracle not available");
        return;
    }

    let mut adapter = connect();
    create_people(&mut adapter);

    let columns = adapter.columns(TABLE, None).expect("columns");
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "bio", "active"]);
    assert!(columns[0].primary);
    assert_eq!(columns[2].column_type, ColumnType::Text);
    assert_eq!(columns[3].column_type, ColumnType::Boolean);

    let dump = adapter.structure_dump().expect("structure dump");
    assert!(dump.contains(&format!("create table {}", TABLE.to_uppercase())));
    assert!(dump.contains(&format!("create sequence {}_SEQ", TABLE.to_uppercase())));

    adapter
        .drop_table(TABLE, &DropTableOptions::default())
        .expect("drop table");
}

#[test]
#[serial]
fn test_oracle_transaction_rollback() {
    if !should_run_e2e_tests() {
        eprintln!("⚠️  Skipping E2E test: Oracle not available");
        return;
    }

    let mut adapter = connect();
    create_people(&mut adapter);

    let insert = format!("INSERT INTO {} (id, name) VALUES (1, 'Tx')", TABLE);
    let result: odbc_adapter::Result<()> = adapter.transaction(|a| {
        a.update(&insert, None)?;
        Err(odbc_adapter::AdapterError::StatementInvalid("abort".into()))
    });
    assert!(result.is_err());

    let count = adapter
        .select_value(&format!("SELECT COUNT(*) FROM {}", TABLE), None)
        .expect("count")
        .and_then(|v| v.as_i64());
    assert_eq!(count, Some(0));

    adapter
        .drop_table(TABLE, &DropTableOptions::default())
        .expect("drop table");
}

fn create_events(adapter: &mut Adapter) {
    // No primary key: the distinct test needs repeated ids.
    let table = TableDefinition::new(TABLE)
        .column(ColumnDefinition::new("id", ColumnType::Integer).not_null())
        .column(ColumnDefinition::new("name", ColumnType::String).limit(40))
        .column(ColumnDefinition::new("created_at", ColumnType::DateTime));
    adapter
        .create_table(&table, &CreateTableOptions::default().without_id().force())
        .expect("create table");
}

fn ids(rows: &[odbc_adapter::Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

#[test]
#[serial]
fn test_oracle_pagination_over_sequential_rows() {
    if !should_run_e2e_tests() {
        eprintln!("⚠️  Skipping E2E test: Oracle not available");
        return;
    }

    let mut adapter = connect();
    create_events(&mut adapter);
    adapter
        .transaction(|a| {
            for id in 1..=100 {
                a.update(
                    &format!("INSERT INTO {} (id, name) VALUES ({}, 'row {}')", TABLE, id, id),
                    None,
                )?;
            }
            Ok(())
        })
        .expect("seed rows");

    let sql = format!("SELECT id, name FROM {} ORDER BY id", TABLE);
    let paged = adapter.add_limit_offset(&sql, Some(10), Some(20));
    let page = adapter.select(&paged, None).expect("page");
    assert_eq!(ids(&page), (21..=30).collect::<Vec<i64>>());
    assert!(page.iter().all(|r| r.get("raw_rnum_").is_none()));

    let offset_only = adapter.add_limit_offset(&sql, None, Some(95));
    let tail = adapter.select(&offset_only, None).expect("offset only");
    assert_eq!(ids(&tail), (96..=100).collect::<Vec<i64>>());

    adapter
        .drop_table(TABLE, &DropTableOptions::default())
        .expect("drop table");
}

#[test]
#[serial]
fn test_oracle_distinct_with_order_keeps_distinct_row_count() {
    if !should_run_e2e_tests() {
        eprintln!("⚠️  Skipping E2E test: Oracle not available");
        return;
    }

    let mut adapter = connect();
    create_events(&mut adapter);
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date");
    let seed = [(1, day(5)), (1, day(2)), (2, day(3)), (2, day(1)), (3, day(4))];
    for (id, created) in seed {
        let sql = format!(
            "INSERT INTO {} (id, created_at) VALUES ({}, {})",
            TABLE,
            id,
            adapter.quote(&Value::Date(created), None)
        );
        adapter.update(&sql, None).expect("insert");
    }

    let plain = adapter
        .select(&format!("SELECT DISTINCT t.id FROM {} t", TABLE), None)
        .expect("plain distinct");

    let order_by = "t.created_at DESC";
    let select = format!("SELECT {} FROM {} t", adapter.distinct("t.id", order_by), TABLE);
    let sql = adapter.add_order_by_for_association_limiting(&select, order_by);
    let ordered = adapter.select(&sql, None).expect("ordered distinct");

    assert_eq!(ordered.len(), plain.len());
    assert_eq!(ids(&ordered), vec![1, 3, 2]);
    assert!(ordered.iter().all(|r| r.columns().eq(["id"])));

    adapter
        .drop_table(TABLE, &DropTableOptions::default())
        .expect("drop table");
}
