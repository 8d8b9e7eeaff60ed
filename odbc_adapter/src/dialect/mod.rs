pub mod generic;
pub mod oracle;
pub mod postgres;
pub mod registry;
pub mod sqlserver;

pub use generic::GenericDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use registry::{DialectRegistry, DialectRegistryBuilder};
pub use sqlserver::SqlServerDialect;

use crate::adapter::hooks::PostSaveHook;
use crate::config::AdapterConfig;
use crate::connection::{CatalogSql, Connection, Row};
use crate::error::{AdapterError, Result};
use crate::schema::{
    ColumnDefinition, ColumnOptions, CreateTableOptions, DdlStatement, DropTableOptions,
    TableDefinition,
};
use crate::sql::StatementKind;
use crate::types::{ColumnDescriptor, ColumnType, TypeMap, Value};
use std::sync::Arc;

/// How `insert` obtains the primary key of the new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertStrategy {
    /// Run the statement as given.
    Execute,
    /// Fetch the next value of `sequence_name` and bind it to the statement's placeholder.
    Sequence { sequence_name: String },
}

/// Vendor behaviour bound to an adapter.
///
/// Every method has a vendor-neutral default; a dialect overrides what its
/// database does differently. Implementations are stateless and shared.
pub trait Dialect: Send + Sync {
    /// Registry identity.
    fn name(&self) -> &str;

    /// Whether this dialect serves `key` (the configured dialect or driver).
    fn matches(&self, key: &str, config: &AdapterConfig) -> bool;

    fn adapter_name(&self) -> &str {
        "ODBC"
    }

    // types

    /// Adjusts the base type table for this vendor.
    fn modify_types(&self, _types: &mut TypeMap) {}

    fn simplified_type(&self, sql_type: &str) -> ColumnType {
        crate::types::column::simplified_type(sql_type)
    }

    /// Semantic type of a catalog column.
    fn column_type(&self, sql_type: &str, _primary: bool) -> ColumnType {
        self.simplified_type(sql_type)
    }

    /// Cleans up a default as reported by the catalog.
    fn default_value(&self, raw: Option<&str>) -> Option<String> {
        raw.map(str::to_string)
    }

    /// Idempotent cast of `value` for `column`.
    fn type_cast(&self, value: &Value, column: &ColumnDescriptor) -> Value {
        column.cast(value)
    }

    // catalog and execution

    fn catalog_sql(&self) -> CatalogSql {
        CatalogSql::information_schema()
    }

    /// Schema that scopes catalog introspection.
    fn catalog_schema(&self, _config: &AdapterConfig) -> Option<String> {
        None
    }

    /// Whether `columns` results may be cached between non-query statements.
    fn caches_columns(&self) -> bool {
        true
    }

    fn classify(&self, _sql: &str) -> StatementKind {
        StatementKind::Auto
    }

    /// Column name as callers see it, for names the driver reports.
    fn fold_identifier(&self, name: &str) -> String {
        name.to_string()
    }

    /// Post-processes a selected row before it reaches the caller.
    fn process_row(&self, _row: &mut Row) {}

    fn insert_strategy(
        &self,
        _sql: &str,
        _primary_key: Option<&str>,
        _id_value: Option<&Value>,
        _sequence_name: Option<&str>,
    ) -> Result<InsertStrategy> {
        Ok(InsertStrategy::Execute)
    }

    fn default_sequence_name(&self, _table: &str, _column: Option<&str>) -> Option<String> {
        None
    }

    /// Query returning the next sequence value in a column named `id`.
    fn next_sequence_value_sql(&self, sequence_name: &str) -> String {
        format!("SELECT NEXT VALUE FOR {} AS id", sequence_name)
    }

    fn validation_query(&self) -> &str {
        "SELECT 1"
    }

    /// Query returning the current database name as its first column.
    fn current_database_sql(&self) -> Option<&str> {
        None
    }

    // quoting

    fn quote_table_name(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_column_name(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_column_name(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Escapes a string body; the caller adds the surrounding quotes.
    fn quote_string(&self, text: &str) -> String {
        text.replace('\'', "''")
    }

    fn quoted_true(&self) -> &str {
        "'t'"
    }

    fn quoted_false(&self) -> &str {
        "'f'"
    }

    /// Literal for a date, date-time or time value.
    fn quoted_date(&self, value: &Value) -> String {
        generic::quoted_date(self, value)
    }

    /// SQL literal for `value`, optionally shaped by the target column.
    fn quote(&self, value: &Value, column: Option<&ColumnDescriptor>) -> String {
        generic::quote(self, value, column)
    }

    // query shaping

    fn add_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        generic::add_limit_offset(sql, limit, offset)
    }

    /// `DISTINCT` clause for `columns` that stays valid under `order_by`.
    fn distinct(&self, columns: &str, _order_by: &str) -> String {
        format!("DISTINCT {}", columns)
    }

    /// Appends the `ORDER BY` that accompanies [`Dialect::distinct`].
    fn add_order_by_for_association_limiting(&self, sql: &str, order_by: &str) -> String {
        generic::append_order_by(sql, order_by)
    }

    // DDL

    fn table_alias_length(&self) -> usize {
        255
    }

    fn create_table_statements(
        &self,
        table: &TableDefinition,
        options: &CreateTableOptions,
        types: &TypeMap,
        _config: &AdapterConfig,
    ) -> Result<Vec<DdlStatement>> {
        Ok(vec![DdlStatement::required(generic::create_table_sql(
            self, table, options, types,
        )?)])
    }

    fn drop_table_statements(&self, name: &str, _options: &DropTableOptions) -> Vec<DdlStatement> {
        vec![DdlStatement::required(format!(
            "DROP TABLE {}",
            self.quote_table_name(name)
        ))]
    }

    fn rename_table_statements(&self, name: &str, new_name: &str) -> Vec<DdlStatement> {
        vec![DdlStatement::required(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_table_name(name),
            self.quote_table_name(new_name)
        ))]
    }

    fn add_column_sql(
        &self,
        table: &str,
        column: &ColumnDefinition,
        types: &TypeMap,
    ) -> Result<String> {
        let mut sql = format!(
            "ALTER TABLE {} ADD {} {}",
            self.quote_table_name(table),
            self.quote_column_name(&column.name),
            column.sql_type(types)?
        );
        self.add_column_options(&mut sql, &column.options(types)?);
        Ok(sql)
    }

    fn remove_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_table_name(table),
            self.quote_column_name(column)
        )
    }

    fn rename_column_sql(&self, table: &str, column: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_table_name(table),
            self.quote_column_name(column),
            self.quote_column_name(new_name)
        )
    }

    fn change_column_sql(
        &self,
        table: &str,
        column: &ColumnDefinition,
        types: &TypeMap,
    ) -> Result<String> {
        let mut sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            self.quote_table_name(table),
            self.quote_column_name(&column.name),
            column.sql_type(types)?
        );
        self.add_column_options(&mut sql, &column.options(types)?);
        Ok(sql)
    }

    fn change_column_default_sql(&self, table: &str, column: &str, default: &Value) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
            self.quote_table_name(table),
            self.quote_column_name(column),
            self.quote(default, None)
        )
    }

    fn remove_index_sql(&self, _table: &str, index_name: &str) -> String {
        format!("DROP INDEX {}", self.quote_column_name(index_name))
    }

    /// Appends `DEFAULT` and `NOT NULL` clauses.
    fn add_column_options(&self, sql: &mut String, options: &ColumnOptions) {
        generic::add_column_options(self, sql, options)
    }

    // whole-schema operations

    fn structure_dump(&self, _conn: &mut dyn Connection) -> Result<String> {
        Err(AdapterError::UnsupportedFeature(format!(
            "structure_dump for {}",
            self.adapter_name()
        )))
    }

    fn structure_drop(&self, _conn: &mut dyn Connection) -> Result<String> {
        Err(AdapterError::UnsupportedFeature(format!(
            "structure_drop for {}",
            self.adapter_name()
        )))
    }

    /// Whether recreating a database means dropping every table in it.
    fn drops_tables_to_recreate(&self) -> bool {
        false
    }

    /// Hooks the adapter registers when it binds this dialect.
    fn post_save_hooks(&self) -> Vec<Arc<dyn PostSaveHook>> {
        Vec::new()
    }
}
