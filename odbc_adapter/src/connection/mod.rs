pub mod catalog;
pub mod cell_reader;
pub mod odbc;
pub mod row;

pub use catalog::{CatalogColumn, CatalogQuery, CatalogSql};
pub use odbc::OdbcConnection;
pub use row::Row;

use crate::error::Result;
use crate::types::Value;

/// Outcome of a raw `execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    Rows(Vec<Row>),
    Affected(u64),
}

impl ExecResult {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            ExecResult::Rows(rows) => rows,
            ExecResult::Affected(_) => Vec::new(),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            ExecResult::Rows(rows) => rows.len() as u64,
            ExecResult::Affected(n) => *n,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, ExecResult::Rows(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub table: String,
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Payload for a large-object write issued after a row has been saved.
#[derive(Debug, Clone, PartialEq)]
pub struct LargeObject {
    pub binary: bool,
    pub column: String,
    pub table: String,
    pub primary_key: String,
    /// Already-quoted primary key value.
    pub id: String,
    pub value: Value,
}

/// A live database session.
///
/// Implementations own exactly one session and expect at most one call in
/// flight; the adapter never shares one across threads concurrently.
pub trait Connection: Send {
    /// Runs any statement; the driver decides whether it produced rows.
    fn execute(&mut self, sql: &str) -> Result<ExecResult>;

    fn execute_query(&mut self, sql: &str) -> Result<Vec<Row>>;

    fn execute_update(&mut self, sql: &str) -> Result<u64>;

    /// Runs an INSERT whose single `?` placeholder receives `id`.
    fn execute_id_insert(&mut self, sql: &str, id: i64) -> Result<u64>;

    fn columns(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<CatalogColumn>>;

    fn tables(&mut self, schema: Option<&str>) -> Result<Vec<String>>;

    fn indexes(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<IndexDefinition>>;

    fn primary_keys(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<String>>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn reconnect(&mut self) -> Result<()>;

    fn disconnect(&mut self) -> Result<()>;

    fn write_large_object(&mut self, lob: &LargeObject) -> Result<()>;

    fn database_product_name(&mut self) -> Result<String>;

    fn database_name(&mut self) -> Result<Option<String>>;

    /// Key generated by the last insert, for drivers that report one.
    fn last_insert_id(&mut self) -> Result<Option<i64>> {
        Ok(None)
    }
}

/// Groups `index_name, uniqueness, column_name` rows into definitions,
/// preserving the order indexes and their columns first appear in.
pub(crate) fn group_index_rows(table: &str, rows: &[Row]) -> Vec<IndexDefinition> {
    let mut indexes: Vec<IndexDefinition> = Vec::new();
    for row in rows {
        let (Some(name), Some(column)) = (row.text_ci("index_name"), row.text_ci("column_name"))
        else {
            continue;
        };
        let unique = row
            .text_ci("uniqueness")
            .map(|u| u.eq_ignore_ascii_case("UNIQUE"))
            .unwrap_or(false);
        match indexes.iter_mut().find(|idx| idx.name == name) {
            Some(index) => index.columns.push(column),
            None => indexes.push(IndexDefinition {
                table: table.to_string(),
                name,
                unique,
                columns: vec![column],
            }),
        }
    }
    indexes
}
