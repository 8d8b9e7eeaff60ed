//! Oracle dialect.
//!
//! Oracle has no `LIMIT`, no identity columns before 12c and no boolean
//! type, so most of the override surface is used here: pagination goes
//! through `ROWNUM`, surrogate keys come from `<table>_seq` sequences,
//! booleans are `NUMBER(1)` and LOB columns are written after the row is
//! saved (see [`OracleLobHook`]).

pub mod column;
pub mod lob;
pub mod structure;

pub use lob::OracleLobHook;

use super::{generic, Dialect, InsertStrategy};
use crate::adapter::hooks::PostSaveHook;
use crate::config::AdapterConfig;
use crate::connection::{CatalogSql, Connection, Row};
use crate::error::{AdapterError, Result};
use crate::schema::{
    ColumnDefinition, ColumnOptions, CreateTableOptions, DdlStatement, DropTableOptions,
    TableDefinition,
};
use crate::sql::{classify_statement, insert_table_name, strip_statement, OrderBy, StatementKind};
use crate::types::value::{DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};
use crate::types::{ColumnDescriptor, ColumnType, NativeType, TypeMap, Value};
use std::sync::Arc;

/// Longest identifier Oracle accepts.
pub const IDENTIFIER_MAX_LENGTH: usize = 30;
pub const DEFAULT_SEQUENCE_START: u64 = 10000;

const ROW_NUMBER_COLUMN: &str = "raw_rnum_";

lazy_static::lazy_static! {
    static ref UNQUOTED_IDENTIFIER: regex::Regex =
        regex::Regex::new(r"^[a-z0-9_$#]+$").expect("valid identifier regex");
    static ref DISTINCT_ALIAS: regex::Regex =
        regex::Regex::new(r"^alias_\d+__$").expect("valid alias regex");
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
    pub fn new() -> Self {
        Self
    }

    fn sequence_for(table: &str, sequence_name: Option<&str>) -> String {
        sequence_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_seq", table))
    }
}

fn is_upper_case_identifier(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase()) && !name.chars().any(|c| c.is_ascii_lowercase())
}

impl Dialect for OracleDialect {
    fn name(&self) -> &str {
        "oracle"
    }

    fn matches(&self, key: &str, _config: &AdapterConfig) -> bool {
        key.to_ascii_lowercase().contains("oracle")
    }

    fn adapter_name(&self) -> &str {
        "Oracle"
    }

    fn modify_types(&self, types: &mut TypeMap) {
        // Every NUMBER entry carries a limit, so NUMBER(1) and NUMBER(38)
        // reverse-map to Boolean and Integer respectively.
        types.set_primary_key("NUMBER(38) NOT NULL PRIMARY KEY");
        types.set(ColumnType::String, NativeType::with_limit("VARCHAR2", 255));
        types.set(ColumnType::Integer, NativeType::with_limit("NUMBER", 38));
        types.set(ColumnType::DateTime, NativeType::new("DATE"));
        types.set(ColumnType::Timestamp, NativeType::new("DATE"));
        types.set(ColumnType::Time, NativeType::new("DATE"));
        types.set(ColumnType::Date, NativeType::new("DATE"));
        types.set(ColumnType::Boolean, NativeType::with_limit("NUMBER", 1));
    }

    fn simplified_type(&self, sql_type: &str) -> ColumnType {
        column::simplified_type(sql_type).unwrap_or(ColumnType::String)
    }

    fn column_type(&self, sql_type: &str, primary: bool) -> ColumnType {
        column::column_type(sql_type, primary)
    }

    fn default_value(&self, raw: Option<&str>) -> Option<String> {
        column::default_value(raw)
    }

    fn type_cast(&self, value: &Value, column: &ColumnDescriptor) -> Value {
        column::type_cast(value, column)
    }

    fn catalog_sql(&self) -> CatalogSql {
        CatalogSql::oracle()
    }

    /// Schemas are created under the user name.
    fn catalog_schema(&self, config: &AdapterConfig) -> Option<String> {
        config
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_ascii_uppercase)
    }

    fn caches_columns(&self) -> bool {
        false
    }

    fn classify(&self, sql: &str) -> StatementKind {
        classify_statement(sql)
    }

    /// Unquoted identifiers come back upper case; fold them to lower case.
    fn fold_identifier(&self, name: &str) -> String {
        if is_upper_case_identifier(name) {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    fn process_row(&self, row: &mut Row) {
        row.rename_columns(|name| {
            is_upper_case_identifier(name).then(|| name.to_ascii_lowercase())
        });
        row.retain(|name| name != ROW_NUMBER_COLUMN && !DISTINCT_ALIAS.is_match(name));
    }

    fn insert_strategy(
        &self,
        sql: &str,
        primary_key: Option<&str>,
        id_value: Option<&Value>,
        sequence_name: Option<&str>,
    ) -> Result<InsertStrategy> {
        // A supplied id, literal SQL included, is already in the statement.
        let preassigned = id_value.is_some_and(|v| !v.is_null());
        if preassigned || primary_key.is_none() {
            return Ok(InsertStrategy::Execute);
        }
        let sequence_name = match sequence_name {
            Some(name) => name.to_string(),
            None => {
                let table = insert_table_name(sql).ok_or_else(|| {
                    AdapterError::StatementInvalid(format!(
                        "cannot determine the target table of: {}",
                        sql
                    ))
                })?;
                Self::sequence_for(&table, None)
            }
        };
        Ok(InsertStrategy::Sequence { sequence_name })
    }

    fn default_sequence_name(&self, table: &str, _column: Option<&str>) -> Option<String> {
        Some(Self::sequence_for(table, None))
    }

    fn next_sequence_value_sql(&self, sequence_name: &str) -> String {
        format!("select {}.nextval id from dual", sequence_name)
    }

    fn validation_query(&self) -> &str {
        "SELECT 1 FROM DUAL"
    }

    fn current_database_sql(&self) -> Option<&str> {
        Some("select sys_context('userenv','db_name') db from dual")
    }

    /// Table names go out as given so schema-qualified names keep working.
    fn quote_table_name(&self, name: &str) -> String {
        name.to_string()
    }

    fn quote_column_name(&self, name: &str) -> String {
        if UNQUOTED_IDENTIFIER.is_match(name) {
            name.to_string()
        } else {
            format!("\"{}\"", name)
        }
    }

    fn quoted_true(&self) -> &str {
        "1"
    }

    fn quoted_false(&self) -> &str {
        "0"
    }

    fn quoted_date(&self, value: &Value) -> String {
        match value {
            Value::Date(d) => format!(
                "TO_DATE('{}', 'YYYY-MM-DD')",
                d.format(DATE_FORMAT)
            ),
            Value::DateTime(dt) => format!("TIMESTAMP'{}'", dt.format(DATETIME_FORMAT)),
            // DATE always carries a day; a bare time lands on a fixed one.
            Value::Time(t) => format!("TIMESTAMP'2000-01-01 {}'", t.format(TIME_FORMAT)),
            other => generic::quote(self, other, None),
        }
    }

    fn quote(&self, value: &Value, column: Option<&ColumnDescriptor>) -> String {
        if let Value::Literal(sql) = value {
            return sql.clone();
        }
        if let Some(col) = column {
            if matches!(col.column_type, ColumnType::Text | ColumnType::Binary) {
                let base = col.sql_type.split('(').next().unwrap_or_default().trim();
                return match base {
                    "" => "empty_blob()".to_string(),
                    base => format!("empty_{}()", base.to_lowercase()),
                };
            }
            if col.primary && !col.column_type.is_textual() && !value.is_null() {
                return value.as_i64().unwrap_or(0).to_string();
            }
        }
        generic::quote(self, value, column)
    }

    /// Wraps the query in a `ROWNUM` window; the `raw_rnum_` column it adds
    /// is stripped again by [`Dialect::process_row`].
    fn add_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        let offset = offset.unwrap_or(0);
        let inner = strip_statement(sql);
        match limit {
            Some(limit) => format!(
                "select * from (select raw_sql_.*, rownum {rn} from ({inner}) raw_sql_ \
                 where rownum <= {upper}) where {rn} > {offset}",
                rn = ROW_NUMBER_COLUMN,
                inner = inner,
                upper = offset.saturating_add(limit),
                offset = offset
            ),
            None if offset > 0 => format!(
                "select * from (select raw_sql_.*, rownum {rn} from ({inner}) raw_sql_) \
                 where {rn} > {offset}",
                rn = ROW_NUMBER_COLUMN,
                inner = inner,
                offset = offset
            ),
            None => sql.to_string(),
        }
    }

    /// Oracle wants ORDER BY columns in a DISTINCT select list. Each one is
    /// added as `FIRST_VALUE(..) OVER (PARTITION BY <columns> ..)`, which is
    /// constant per distinct group, under an `alias_<i>__` name that
    /// [`Dialect::add_order_by_for_association_limiting`] orders by.
    fn distinct(&self, columns: &str, order_by: &str) -> String {
        let order = OrderBy::parse(order_by);
        if order.is_empty() {
            return format!("DISTINCT {}", columns);
        }
        let windows: Vec<String> = order
            .terms
            .iter()
            .enumerate()
            .map(|(i, term)| {
                format!(
                    "FIRST_VALUE({}) OVER (PARTITION BY {} ORDER BY {}) AS alias_{}__",
                    term.expression, columns, term, i
                )
            })
            .collect();
        format!("DISTINCT {}, {}", columns, windows.join(", "))
    }

    fn add_order_by_for_association_limiting(&self, sql: &str, order_by: &str) -> String {
        let order = OrderBy::parse(order_by);
        if order.is_empty() {
            return sql.to_string();
        }
        let terms: Vec<String> = order
            .terms
            .iter()
            .enumerate()
            .map(|(i, term)| match &term.direction {
                Some(direction) => format!("alias_{}__ {}", i, direction),
                None => format!("alias_{}__", i),
            })
            .collect();
        format!("{} ORDER BY {}", sql.trim_end(), terms.join(", "))
    }

    fn table_alias_length(&self) -> usize {
        IDENTIFIER_MAX_LENGTH
    }

    fn create_table_statements(
        &self,
        table: &TableDefinition,
        options: &CreateTableOptions,
        types: &TypeMap,
        config: &AdapterConfig,
    ) -> Result<Vec<DdlStatement>> {
        let sequence = Self::sequence_for(&table.name, options.sequence_name.as_deref());
        if sequence.len() > self.table_alias_length() {
            return Err(AdapterError::StatementInvalid(format!(
                "name {} too long",
                sequence
            )));
        }
        let start = options
            .sequence_start_value
            .or_else(|| config.option_u64("sequence_start_value"))
            .unwrap_or(DEFAULT_SEQUENCE_START);

        let mut statements = vec![DdlStatement::required(generic::create_table_sql(
            self, table, options, types,
        )?)];
        if options.id {
            statements.push(DdlStatement::required(format!(
                "CREATE SEQUENCE {} START WITH {}",
                sequence, start
            )));
        }
        Ok(statements)
    }

    fn drop_table_statements(&self, name: &str, options: &DropTableOptions) -> Vec<DdlStatement> {
        vec![
            DdlStatement::required(format!("DROP TABLE {}", self.quote_table_name(name))),
            DdlStatement::best_effort(format!(
                "DROP SEQUENCE {}",
                Self::sequence_for(name, options.sequence_name.as_deref())
            )),
        ]
    }

    fn rename_table_statements(&self, name: &str, new_name: &str) -> Vec<DdlStatement> {
        vec![
            DdlStatement::required(format!("RENAME {} TO {}", name, new_name)),
            DdlStatement::best_effort(format!("RENAME {}_seq TO {}_seq", name, new_name)),
        ]
    }

    fn rename_column_sql(&self, table: &str, column: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} to {}",
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
            "ALTER TABLE {} MODIFY {} {}",
            self.quote_table_name(table),
            self.quote_column_name(&column.name),
            column.sql_type(types)?
        );
        self.add_column_options(&mut sql, &column.options(types)?);
        Ok(sql)
    }

    fn change_column_default_sql(&self, table: &str, column: &str, default: &Value) -> String {
        format!(
            "ALTER TABLE {} MODIFY {} DEFAULT {}",
            self.quote_table_name(table),
            self.quote_column_name(column),
            self.quote(default, None)
        )
    }

    /// CLOB defaults are plain literals; quoting them through the column
    /// would produce `empty_clob()`.
    fn add_column_options(&self, sql: &mut String, options: &ColumnOptions) {
        let text_default = options
            .column
            .as_ref()
            .is_some_and(|c| c.column_type == ColumnType::Text);
        match (&options.default, text_default) {
            (Some(default), true) => {
                sql.push_str(" DEFAULT ");
                sql.push_str(&self.quote(default, None));
                let rest = ColumnOptions {
                    default: None,
                    ..options.clone()
                };
                generic::add_column_options(self, sql, &rest);
            }
            _ => generic::add_column_options(self, sql, options),
        }
    }

    fn structure_dump(&self, conn: &mut dyn Connection) -> Result<String> {
        structure::structure_dump(conn)
    }

    fn structure_drop(&self, conn: &mut dyn Connection) -> Result<String> {
        structure::structure_drop(conn)
    }

    fn drops_tables_to_recreate(&self) -> bool {
        true
    }

    fn post_save_hooks(&self) -> Vec<Arc<dyn PostSaveHook>> {
        vec![Arc::new(OracleLobHook)]
    }
}
