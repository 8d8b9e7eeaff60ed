pub mod column;
pub mod value;

pub use column::ColumnDescriptor;
pub use value::Value;

use crate::error::{AdapterError, Result};
use std::fmt;

lazy_static::lazy_static! {
    static ref BRACKETED_DECL: regex::Regex =
        regex::Regex::new(r"^\s*([A-Za-z_][\w ]*?)\s*\(\s*(\d+)\s*(?:,\s*\d+\s*)?\)")
            .expect("valid bracketed declaration regex");
    static ref BARE_DECL: regex::Regex =
        regex::Regex::new(r"^\s*([A-Za-z_][\w ]*?)\s*$").expect("valid bare declaration regex");
}

/// Semantic column type, independent of vendor syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    PrimaryKey,
    String,
    Text,
    Integer,
    Float,
    Decimal,
    DateTime,
    Timestamp,
    Time,
    Date,
    Binary,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::PrimaryKey => "primary_key",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Time => "time",
            ColumnType::Date => "date",
            ColumnType::Binary => "binary",
            ColumnType::Boolean => "boolean",
        }
    }

    /// String-backed types: values stay textual and are quoted as strings.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Text)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Float | ColumnType::Decimal | ColumnType::PrimaryKey
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native type descriptor: `{name, limit}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    pub name: String,
    pub limit: Option<u32>,
}

impl NativeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit: None,
        }
    }

    pub fn with_limit(name: impl Into<String>, limit: u32) -> Self {
        Self {
            name: name.into(),
            limit: Some(limit),
        }
    }
}

/// Semantic type to native type table.
///
/// Entries keep insertion order; reverse lookups scan in that order and the
/// first structural match wins. Overriding an entry keeps its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap {
    primary_key: String,
    entries: Vec<(ColumnType, NativeType)>,
}

impl TypeMap {
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            entries: Vec::new(),
        }
    }

    /// Vendor-neutral base table.
    pub fn generic() -> Self {
        let mut types = Self::new("INTEGER NOT NULL PRIMARY KEY");
        types.set(ColumnType::String, NativeType::with_limit("VARCHAR", 255));
        types.set(ColumnType::Text, NativeType::new("CLOB"));
        types.set(ColumnType::Integer, NativeType::new("INTEGER"));
        types.set(ColumnType::Float, NativeType::new("FLOAT"));
        types.set(ColumnType::Decimal, NativeType::new("DECIMAL"));
        types.set(ColumnType::DateTime, NativeType::new("TIMESTAMP"));
        types.set(ColumnType::Timestamp, NativeType::new("TIMESTAMP"));
        types.set(ColumnType::Time, NativeType::new("TIME"));
        types.set(ColumnType::Date, NativeType::new("DATE"));
        types.set(ColumnType::Binary, NativeType::new("BLOB"));
        types.set(ColumnType::Boolean, NativeType::new("BOOLEAN"));
        types
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn set_primary_key(&mut self, declaration: impl Into<String>) {
        self.primary_key = declaration.into();
    }

    pub fn get(&self, column_type: ColumnType) -> Option<&NativeType> {
        self.entries
            .iter()
            .find(|(t, _)| *t == column_type)
            .map(|(_, native)| native)
    }

    /// Replaces the entry in place, or appends when the type is new.
    pub fn set(&mut self, column_type: ColumnType, native: NativeType) {
        if column_type == ColumnType::PrimaryKey {
            self.primary_key = native.name;
            return;
        }
        match self.entries.iter_mut().find(|(t, _)| *t == column_type) {
            Some(entry) => entry.1 = native,
            None => self.entries.push((column_type, native)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnType, &NativeType)> {
        self.entries.iter().map(|(t, n)| (*t, n))
    }

    /// Reverse-maps a native declaration such as `NUMBER(38)` or `DATE`.
    ///
    /// * exact primary-key declaration: `(PrimaryKey, None)`
    /// * `NAME(n)` / `NAME(p,s)`: first entry whose name matches
    ///   case-insensitively and whose limit is unset or equal to `n`;
    ///   `(None, None)` when nothing matches
    /// * `NAME`: first entry with that name; `(String, 255)` when none
    /// * anything unrecognizable: `(String, 255)`
    pub fn native_sql_to_type(&self, declaration: &str) -> (Option<ColumnType>, Option<u32>) {
        if declaration.trim() == self.primary_key {
            return (Some(ColumnType::PrimaryKey), None);
        }

        if let Some(caps) = BRACKETED_DECL.captures(declaration) {
            let name = &caps[1];
            let Ok(limit) = caps[2].parse::<u32>() else {
                return (None, None);
            };
            return match self.find_entry(name, Some(limit)) {
                Some(column_type) => (Some(column_type), Some(limit)),
                None => (None, None),
            };
        }

        if let Some(caps) = BARE_DECL.captures(declaration) {
            if let Some(column_type) = self.find_entry(&caps[1], None) {
                return (Some(column_type), None);
            }
        }

        (Some(ColumnType::String), Some(255))
    }

    fn find_entry(&self, name: &str, limit: Option<u32>) -> Option<ColumnType> {
        self.entries
            .iter()
            .find(|(_, native)| {
                native.name.eq_ignore_ascii_case(name)
                    && (native.limit.is_none() || native.limit == limit)
            })
            .map(|(t, _)| *t)
    }

    /// Forward mapping used by DDL generation.
    pub fn type_to_sql(
        &self,
        column_type: ColumnType,
        limit: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> Result<String> {
        if column_type == ColumnType::PrimaryKey {
            return Ok(self.primary_key.clone());
        }
        let native = self.get(column_type).ok_or_else(|| {
            AdapterError::ValidationError(format!("no native type for {}", column_type))
        })?;

        if column_type == ColumnType::Decimal {
            if let Some(p) = precision {
                return Ok(match scale {
                    Some(s) => format!("{}({},{})", native.name, p, s),
                    None => format!("{}({})", native.name, p),
                });
            }
        }

        Ok(match limit.or(native.limit) {
            Some(l) => format!("{}({})", native.name, l),
            None => native.name.clone(),
        })
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        Self::generic()
    }
}
