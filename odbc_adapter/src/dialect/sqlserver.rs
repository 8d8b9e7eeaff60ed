use super::{generic, Dialect};
use crate::config::AdapterConfig;
use crate::error::Result;
use crate::schema::{ColumnDefinition, DdlStatement};
use crate::sql::{has_top_level_order_by, strip_statement};
use crate::types::{ColumnDescriptor, ColumnType, NativeType, TypeMap, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &str {
        "sqlserver"
    }

    fn matches(&self, key: &str, _config: &AdapterConfig) -> bool {
        let lower = key.to_ascii_lowercase();
        lower.contains("sql server") || lower.contains("sqlserver") || lower.contains("mssql")
    }

    fn adapter_name(&self) -> &str {
        "SQLServer"
    }

    fn modify_types(&self, types: &mut TypeMap) {
        types.set_primary_key("INT IDENTITY(1,1) PRIMARY KEY");
        types.set(ColumnType::Text, NativeType::new("NVARCHAR(MAX)"));
        types.set(ColumnType::Integer, NativeType::new("INT"));
        types.set(ColumnType::DateTime, NativeType::new("DATETIME2"));
        types.set(ColumnType::Timestamp, NativeType::new("DATETIME2"));
        types.set(ColumnType::Binary, NativeType::new("VARBINARY(MAX)"));
        types.set(ColumnType::Boolean, NativeType::new("BIT"));
    }

    fn current_database_sql(&self) -> Option<&str> {
        Some("SELECT DB_NAME()")
    }

    fn quote_column_name(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn quoted_true(&self) -> &str {
        "1"
    }

    fn quoted_false(&self) -> &str {
        "0"
    }

    fn quote(&self, value: &Value, column: Option<&ColumnDescriptor>) -> String {
        match value {
            Value::Binary(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                format!("0x{}", hex)
            }
            other => generic::quote(self, other, column),
        }
    }

    /// `OFFSET .. FETCH` needs an `ORDER BY`; a neutral one is added when missing.
    fn add_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        let offset = offset.unwrap_or(0);
        if limit.is_none() && offset == 0 {
            return sql.to_string();
        }
        let mut out = strip_statement(sql).to_string();
        if !has_top_level_order_by(&out) {
            out.push_str(" ORDER BY (SELECT NULL)");
        }
        out.push_str(&format!(" OFFSET {} ROWS", offset));
        if let Some(limit) = limit {
            out.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit));
        }
        out
    }

    fn rename_table_statements(&self, name: &str, new_name: &str) -> Vec<DdlStatement> {
        vec![DdlStatement::required(format!(
            "EXEC sp_rename '{}', '{}'",
            self.quote_string(name),
            self.quote_string(new_name)
        ))]
    }

    fn rename_column_sql(&self, table: &str, column: &str, new_name: &str) -> String {
        format!(
            "EXEC sp_rename '{}.{}', '{}', 'COLUMN'",
            self.quote_string(table),
            self.quote_string(column),
            self.quote_string(new_name)
        )
    }

    fn change_column_sql(
        &self,
        table: &str,
        column: &ColumnDefinition,
        types: &TypeMap,
    ) -> Result<String> {
        let mut sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            self.quote_table_name(table),
            self.quote_column_name(&column.name),
            column.sql_type(types)?
        );
        if column.null == Some(false) {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }

    fn change_column_default_sql(&self, table: &str, column: &str, default: &Value) -> String {
        format!(
            "ALTER TABLE {} ADD DEFAULT {} FOR {}",
            self.quote_table_name(table),
            self.quote(default, None),
            self.quote_column_name(column)
        )
    }

    fn remove_index_sql(&self, table: &str, index_name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_column_name(index_name),
            self.quote_table_name(table)
        )
    }
}
