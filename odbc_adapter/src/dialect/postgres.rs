use super::{generic, Dialect};
use crate::config::AdapterConfig;
use crate::types::{ColumnDescriptor, ColumnType, NativeType, TypeMap, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn matches(&self, key: &str, _config: &AdapterConfig) -> bool {
        key.to_ascii_lowercase().contains("postgres")
    }

    fn adapter_name(&self) -> &str {
        "PostgreSQL"
    }

    fn modify_types(&self, types: &mut TypeMap) {
        types.set_primary_key("SERIAL PRIMARY KEY");
        types.set(ColumnType::Text, NativeType::new("TEXT"));
        types.set(ColumnType::Float, NativeType::new("DOUBLE PRECISION"));
        types.set(ColumnType::DateTime, NativeType::new("TIMESTAMP"));
        types.set(ColumnType::Timestamp, NativeType::new("TIMESTAMP"));
        types.set(ColumnType::Binary, NativeType::new("BYTEA"));
        types.set(ColumnType::Boolean, NativeType::new("BOOLEAN"));
    }

    /// `SERIAL` columns own a `<table>_<column>_seq` sequence.
    fn default_sequence_name(&self, table: &str, column: Option<&str>) -> Option<String> {
        Some(format!("{}_{}_seq", table, column.unwrap_or("id")))
    }

    fn next_sequence_value_sql(&self, sequence_name: &str) -> String {
        format!("SELECT nextval('{}') AS id", sequence_name)
    }

    fn current_database_sql(&self) -> Option<&str> {
        Some("SELECT current_database()")
    }

    fn quoted_true(&self) -> &str {
        "TRUE"
    }

    fn quoted_false(&self) -> &str {
        "FALSE"
    }

    fn quote(&self, value: &Value, column: Option<&ColumnDescriptor>) -> String {
        match value {
            Value::Binary(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                format!("'\\x{}'::bytea", hex)
            }
            other => generic::quote(self, other, column),
        }
    }
}
