use super::Adapter;
use crate::connection::Row;
use crate::error::Result;
use crate::types::{ColumnDescriptor, Value};

/// A row the caller has just inserted or updated.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecord {
    pub table_name: String,
    pub primary_key: String,
    pub id: Value,
    /// Columns of `table_name`, as returned by [`Adapter::columns`].
    pub columns: Vec<ColumnDescriptor>,
    /// Attribute values keyed by column name.
    pub values: Row,
}

impl SavedRecord {
    pub fn new(table_name: impl Into<String>, primary_key: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: primary_key.into(),
            id: id.into(),
            columns: Vec::new(),
            values: Row::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_values(mut self, values: Row) -> Self {
        self.values = values;
        self
    }
}

/// Callback run by [`Adapter::after_save`] once per saved record.
pub trait PostSaveHook: Send + Sync {
    fn name(&self) -> &str;

    fn after_save(&self, adapter: &mut Adapter, record: &SavedRecord) -> Result<()>;
}
