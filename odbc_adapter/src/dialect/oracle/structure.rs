//! Schema dump and drop scripts built from the Oracle data dictionary.

use crate::connection::{CatalogColumn, Connection};
use crate::error::Result;

const SEQUENCES_SQL: &str = "select sequence_name from user_sequences";
const TABLES_SQL: &str = "select table_name from user_tables";

fn first_column(conn: &mut dyn Connection, sql: &str) -> Result<Vec<String>> {
    Ok(conn
        .execute_query(sql)?
        .iter()
        .filter_map(|row| row.first().and_then(|v| v.to_text()))
        .collect())
}

fn column_clause(column: &CatalogColumn) -> String {
    let mut clause = format!(
        "{} {}",
        column.column_name.to_lowercase(),
        column.declaration().to_lowercase()
    );
    if let Some(default) = column.data_default.as_deref() {
        clause.push_str(" default ");
        clause.push_str(default.trim_end());
    }
    if !column.is_nullable() {
        clause.push_str(" not null");
    }
    clause
}

/// `create sequence` for every sequence, then `create table` for every table.
pub fn structure_dump(conn: &mut dyn Connection) -> Result<String> {
    let mut structure = String::new();
    for sequence in first_column(conn, SEQUENCES_SQL)? {
        structure.push_str(&format!("create sequence {};\n\n", sequence));
    }
    for table in first_column(conn, TABLES_SQL)? {
        let columns: Vec<String> = conn
            .columns(&table, None)?
            .iter()
            .map(column_clause)
            .collect();
        structure.push_str(&format!(
            "create table {} (\n {});\n\n",
            table,
            columns.join(",\n ")
        ));
    }
    Ok(structure)
}

pub fn structure_drop(conn: &mut dyn Connection) -> Result<String> {
    let mut drop = String::new();
    for sequence in first_column(conn, SEQUENCES_SQL)? {
        drop.push_str(&format!("drop sequence {};\n\n", sequence));
    }
    for table in first_column(conn, TABLES_SQL)? {
        drop.push_str(&format!("drop table {} cascade constraints;\n\n", table));
    }
    Ok(drop)
}
