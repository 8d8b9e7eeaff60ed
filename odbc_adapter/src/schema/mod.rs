//! Definitions the adapter turns into DDL.

use crate::error::Result;
use crate::types::{ColumnDescriptor, ColumnType, TypeMap, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub limit: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default: Option<Value>,
    /// `Some(false)` emits `NOT NULL`.
    pub null: Option<bool>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            limit: None,
            precision: None,
            scale: None,
            default: None,
            null: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.null = Some(false);
        self
    }

    pub fn sql_type(&self, types: &TypeMap) -> Result<String> {
        types.type_to_sql(self.column_type, self.limit, self.precision, self.scale)
    }

    /// Descriptor view used when quoting defaults for this column.
    pub fn descriptor(&self, types: &TypeMap) -> Result<ColumnDescriptor> {
        Ok(
            ColumnDescriptor::new(self.name.clone(), self.sql_type(types)?, self.column_type)
                .with_null(self.null.unwrap_or(true)),
        )
    }

    pub fn options(&self, types: &TypeMap) -> Result<ColumnOptions> {
        Ok(ColumnOptions {
            default: self.default.clone(),
            null: self.null,
            column: Some(self.descriptor(types)?),
        })
    }
}

/// Trailing options of a column clause: `DEFAULT` and nullability.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnOptions {
    pub default: Option<Value>,
    pub null: Option<bool>,
    /// Column the default belongs to; drives how the default is quoted.
    pub column: Option<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableOptions {
    /// Adds a surrogate primary key (and, where the dialect uses them, a sequence).
    pub id: bool,
    pub primary_key: String,
    pub sequence_name: Option<String>,
    pub sequence_start_value: Option<u64>,
    /// Drop the table first, ignoring failures.
    pub force: bool,
    /// Appended verbatim after the column list.
    pub options: Option<String>,
}

impl Default for CreateTableOptions {
    fn default() -> Self {
        Self {
            id: true,
            primary_key: "id".to_string(),
            sequence_name: None,
            sequence_start_value: None,
            force: false,
            options: None,
        }
    }
}

impl CreateTableOptions {
    pub fn without_id(mut self) -> Self {
        self.id = false;
        self
    }

    pub fn sequence_name(mut self, name: impl Into<String>) -> Self {
        self.sequence_name = Some(name.into());
        self
    }

    pub fn sequence_start_value(mut self, start: u64) -> Self {
        self.sequence_start_value = Some(start);
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DropTableOptions {
    pub sequence_name: Option<String>,
}

/// One DDL statement; best-effort statements may fail without aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlStatement {
    pub sql: String,
    pub best_effort: bool,
}

impl DdlStatement {
    pub fn required(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            best_effort: false,
        }
    }

    pub fn best_effort(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            best_effort: true,
        }
    }
}

/// Index addressed either by name or by the columns it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTarget {
    Name(String),
    Columns(Vec<String>),
}

impl IndexTarget {
    /// `index_<table>_on_<col>_and_<col>` for column targets.
    pub fn index_name(&self, table: &str) -> String {
        match self {
            IndexTarget::Name(name) => name.clone(),
            IndexTarget::Columns(columns) => {
                format!("index_{}_on_{}", table, columns.join("_and_"))
            }
        }
    }
}
