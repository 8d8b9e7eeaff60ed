use super::row::Row;
use crate::error::{AdapterError, Result};

/// A catalog query in two shapes: without a schema filter, and with one.
///
/// Both take the table name (if any) as the first `?` parameter; the scoped
/// form takes the schema as the last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub unscoped: &'static str,
    pub scoped: &'static str,
}

impl CatalogQuery {
    pub fn for_schema(&self, schema: Option<&str>) -> &'static str {
        match schema.map(str::trim).filter(|s| !s.is_empty()) {
            Some(_) => self.scoped,
            None => self.unscoped,
        }
    }
}

/// Catalog queries a connection runs for introspection.
///
/// Result columns are aliased to a fixed vocabulary so one reader handles
/// every vendor: `column_name, data_type, data_length, data_precision,
/// data_scale, data_default, nullable` for columns, `table_name` for tables,
/// `column_name` for keys and `index_name, uniqueness, column_name` for indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSql {
    pub tables: CatalogQuery,
    pub columns: CatalogQuery,
    pub primary_keys: CatalogQuery,
    pub indexes: Option<CatalogQuery>,
}

impl CatalogSql {
    pub fn information_schema() -> Self {
        Self {
            tables: CatalogQuery {
                unscoped: "SELECT table_name FROM information_schema.tables \
                           WHERE table_type = 'BASE TABLE' ORDER BY table_name",
                scoped: "SELECT table_name FROM information_schema.tables \
                         WHERE table_type = 'BASE TABLE' AND table_schema = ? ORDER BY table_name",
            },
            columns: CatalogQuery {
                unscoped: "SELECT column_name, data_type, \
                           character_maximum_length AS data_length, \
                           numeric_precision AS data_precision, numeric_scale AS data_scale, \
                           column_default AS data_default, \
                           CASE WHEN is_nullable = 'YES' THEN 'Y' ELSE 'N' END AS nullable \
                           FROM information_schema.columns WHERE table_name = ? \
                           ORDER BY ordinal_position",
                scoped: "SELECT column_name, data_type, \
                         character_maximum_length AS data_length, \
                         numeric_precision AS data_precision, numeric_scale AS data_scale, \
                         column_default AS data_default, \
                         CASE WHEN is_nullable = 'YES' THEN 'Y' ELSE 'N' END AS nullable \
                         FROM information_schema.columns WHERE table_name = ? AND table_schema = ? \
                         ORDER BY ordinal_position",
            },
            primary_keys: CatalogQuery {
                unscoped: "SELECT kcu.column_name FROM information_schema.table_constraints tc \
                           JOIN information_schema.key_column_usage kcu \
                           ON tc.constraint_name = kcu.constraint_name \
                           AND tc.table_schema = kcu.table_schema \
                           WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_name = ? \
                           ORDER BY kcu.ordinal_position",
                scoped: "SELECT kcu.column_name FROM information_schema.table_constraints tc \
                         JOIN information_schema.key_column_usage kcu \
                         ON tc.constraint_name = kcu.constraint_name \
                         AND tc.table_schema = kcu.table_schema \
                         WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_name = ? \
                         AND tc.table_schema = ? ORDER BY kcu.ordinal_position",
            },
            indexes: None,
        }
    }

    /// Oracle data dictionary. Unscoped queries read the `USER_*` views.
    pub fn oracle() -> Self {
        Self {
            tables: CatalogQuery {
                unscoped: "SELECT LOWER(table_name) AS table_name FROM user_tables \
                           ORDER BY table_name",
                scoped: "SELECT LOWER(table_name) AS table_name FROM all_tables \
                         WHERE owner = ? ORDER BY table_name",
            },
            columns: CatalogQuery {
                unscoped: "SELECT column_name, data_type, data_length, data_precision, \
                           data_scale, data_default, nullable FROM user_tab_columns \
                           WHERE table_name = UPPER(?) ORDER BY column_id",
                scoped: "SELECT column_name, data_type, data_length, data_precision, \
                         data_scale, data_default, nullable FROM all_tab_columns \
                         WHERE table_name = UPPER(?) AND owner = ? ORDER BY column_id",
            },
            primary_keys: CatalogQuery {
                unscoped: "SELECT LOWER(cc.column_name) AS column_name \
                           FROM user_constraints c JOIN user_cons_columns cc \
                           ON c.constraint_name = cc.constraint_name \
                           WHERE c.constraint_type = 'P' AND c.table_name = UPPER(?) \
                           ORDER BY cc.position",
                scoped: "SELECT LOWER(cc.column_name) AS column_name \
                         FROM all_constraints c JOIN all_cons_columns cc \
                         ON c.owner = cc.owner AND c.constraint_name = cc.constraint_name \
                         WHERE c.constraint_type = 'P' AND c.table_name = UPPER(?) \
                         AND c.owner = ? ORDER BY cc.position",
            },
            indexes: Some(CatalogQuery {
                unscoped: "SELECT LOWER(i.index_name) AS index_name, i.uniqueness, \
                           LOWER(ic.column_name) AS column_name \
                           FROM user_indexes i JOIN user_ind_columns ic \
                           ON i.index_name = ic.index_name \
                           WHERE i.table_name = UPPER(?) AND i.index_name NOT IN \
                           (SELECT constraint_name FROM user_constraints \
                           WHERE constraint_type = 'P') \
                           ORDER BY i.index_name, ic.column_position",
                scoped: "SELECT LOWER(i.index_name) AS index_name, i.uniqueness, \
                         LOWER(ic.column_name) AS column_name \
                         FROM all_indexes i JOIN all_ind_columns ic \
                         ON i.owner = ic.index_owner AND i.index_name = ic.index_name \
                         WHERE i.table_name = UPPER(?) AND i.owner = ? AND i.index_name NOT IN \
                         (SELECT constraint_name FROM all_constraints \
                         WHERE constraint_type = 'P' AND owner = i.owner) \
                         ORDER BY i.index_name, ic.column_position",
            }),
        }
    }
}

impl Default for CatalogSql {
    fn default() -> Self {
        Self::information_schema()
    }
}

/// Raw catalog record for one column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogColumn {
    pub column_name: String,
    pub data_type: String,
    pub data_length: Option<u32>,
    pub data_precision: Option<u32>,
    pub data_scale: Option<u32>,
    pub data_default: Option<String>,
    /// `Y` or `N`.
    pub nullable: String,
}

impl CatalogColumn {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            nullable: "Y".to_string(),
            ..Self::default()
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.data_length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.data_precision = Some(precision);
        self.data_scale = scale;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.data_default = Some(default.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = "N".to_string();
        self
    }

    pub fn from_row(row: &Row) -> Result<Self> {
        let column_name = row.text_ci("column_name").ok_or_else(|| {
            AdapterError::InternalError("catalog row without column_name".to_string())
        })?;
        let number = |key: &str| row.get_ci(key).and_then(|v| v.as_i64()).map(|n| n as u32);
        Ok(Self {
            column_name,
            data_type: row.text_ci("data_type").unwrap_or_default(),
            data_length: number("data_length"),
            data_precision: number("data_precision"),
            data_scale: number("data_scale"),
            data_default: row.text_ci("data_default"),
            nullable: row
                .text_ci("nullable")
                .unwrap_or_else(|| "Y".to_string())
                .to_ascii_uppercase(),
        })
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable != "N"
    }

    /// Native declaration rebuilt from catalog fields: precision and scale
    /// for exact numerics, length for character types.
    pub fn declaration(&self) -> String {
        let upper = self.data_type.to_ascii_uppercase();
        let exact_numeric = matches!(upper.as_str(), "NUMBER" | "NUMERIC" | "DECIMAL");
        match (exact_numeric, self.data_precision) {
            (true, Some(p)) => match self.data_scale {
                Some(s) => format!("{}({},{})", self.data_type, p, s),
                None => format!("{}({})", self.data_type, p),
            },
            _ if upper.contains("CHAR") => match self.data_length {
                Some(len) => format!("{}({})", self.data_type, len),
                None => self.data_type.clone(),
            },
            _ => self.data_type.clone(),
        }
    }
}
