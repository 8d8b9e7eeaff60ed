use super::Dialect;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};
use crate::schema::{ColumnOptions, CreateTableOptions, TableDefinition};
use crate::sql::{strip_statement, OrderBy};
use crate::types::value::{DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};
use crate::types::{ColumnDescriptor, ColumnType, Value};

/// Behaviour used when no registered dialect matches the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl GenericDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &str {
        "generic"
    }

    fn matches(&self, _key: &str, _config: &AdapterConfig) -> bool {
        false
    }
}

pub fn quoted_date<D: Dialect + ?Sized>(dialect: &D, value: &Value) -> String {
    match value {
        Value::Date(d) => format!("'{}'", d.format(DATE_FORMAT)),
        Value::DateTime(dt) => format!("'{}'", dt.format(DATETIME_FORMAT)),
        Value::Time(t) => format!("'{}'", t.format(TIME_FORMAT)),
        other => quote(dialect, other, None),
    }
}

pub fn quote<D: Dialect + ?Sized>(
    dialect: &D,
    value: &Value,
    column: Option<&ColumnDescriptor>,
) -> String {
    let column_type = column.map(|c| c.column_type);
    match value {
        Value::Null => "NULL".to_string(),
        Value::Literal(sql) => sql.clone(),
        Value::Bool(b) => match column_type {
            Some(ColumnType::Integer) => if *b { "1" } else { "0" }.to_string(),
            _ => if *b {
                dialect.quoted_true()
            } else {
                dialect.quoted_false()
            }
            .to_string(),
        },
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.clone(),
        Value::String(s) => match column_type {
            Some(ColumnType::Integer | ColumnType::PrimaryKey | ColumnType::Float) => {
                crate::types::column::cast_value(column_type.unwrap_or(ColumnType::Integer), value)
                    .to_text()
                    .unwrap_or_else(|| "NULL".to_string())
            }
            Some(ColumnType::Binary) => hex_literal(s.as_bytes()),
            _ => format!("'{}'", dialect.quote_string(s)),
        },
        Value::Date(_) | Value::DateTime(_) | Value::Time(_) => dialect.quoted_date(value),
        Value::Binary(bytes) => hex_literal(bytes),
    }
}

fn hex_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("X'");
    for b in bytes {
        out.push_str(&format!("{:02X}", b));
    }
    out.push('\'');
    out
}

/// `LIMIT`/`OFFSET` pagination.
pub fn add_limit_offset(sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
    let sql = strip_statement(sql);
    match (limit, offset.filter(|o| *o > 0)) {
        (Some(l), Some(o)) => format!("{} LIMIT {} OFFSET {}", sql, l, o),
        (Some(l), None) => format!("{} LIMIT {}", sql, l),
        (None, Some(o)) => format!("{} OFFSET {}", sql, o),
        (None, None) => sql.to_string(),
    }
}

pub fn append_order_by(sql: &str, order_by: &str) -> String {
    if OrderBy::parse(order_by).is_empty() {
        return sql.to_string();
    }
    format!("{} ORDER BY {}", sql.trim_end(), order_by.trim())
}

pub fn add_column_options<D: Dialect + ?Sized>(
    dialect: &D,
    sql: &mut String,
    options: &ColumnOptions,
) {
    if let Some(default) = &options.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&dialect.quote(default, options.column.as_ref()));
    }
    if options.null == Some(false) {
        sql.push_str(" NOT NULL");
    }
}

pub fn create_table_sql<D: Dialect + ?Sized>(
    dialect: &D,
    table: &TableDefinition,
    options: &CreateTableOptions,
    types: &crate::types::TypeMap,
) -> Result<String> {
    let mut columns = Vec::with_capacity(table.columns.len() + 1);
    if options.id {
        columns.push(format!(
            "{} {}",
            dialect.quote_column_name(&options.primary_key),
            types.primary_key()
        ));
    }
    for column in &table.columns {
        let mut clause = format!(
            "{} {}",
            dialect.quote_column_name(&column.name),
            column.sql_type(types)?
        );
        dialect.add_column_options(&mut clause, &column.options(types)?);
        columns.push(clause);
    }
    if columns.is_empty() {
        return Err(AdapterError::ValidationError(format!(
            "table {} has no columns",
            table.name
        )));
    }

    let mut sql = format!(
        "CREATE TABLE {} ({})",
        dialect.quote_table_name(&table.name),
        columns.join(", ")
    );
    if let Some(extra) = options.options.as_deref().filter(|o| !o.trim().is_empty()) {
        sql.push(' ');
        sql.push_str(extra.trim());
    }
    Ok(sql)
}
