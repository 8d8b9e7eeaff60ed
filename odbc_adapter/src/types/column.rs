use super::value::{parse_date, parse_datetime, parse_time, Value};
use super::ColumnType;

lazy_static::lazy_static! {
    static ref LIMIT: regex::Regex =
        regex::Regex::new(r"\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)").expect("valid limit regex");
    static ref NUMERIC_SCALE: regex::Regex =
        regex::Regex::new(r"(?i)^\s*(?:numeric|decimal|number)\s*\(\s*\d+\s*(?:,\s*(\d+)\s*)?\)")
            .expect("valid scale regex");
    static ref LEADING_INT: regex::Regex =
        regex::Regex::new(r"^\s*([+-]?\d+)").expect("valid integer regex");
}

/// One table column as produced by catalog introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Native declaration, e.g. `NUMBER(10,2)`.
    pub sql_type: String,
    pub column_type: ColumnType,
    pub limit: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub null: bool,
    pub default: Option<String>,
    pub primary: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>, column_type: ColumnType) -> Self {
        let sql_type = sql_type.into();
        let (limit, scale) = extract_limit_and_scale(&sql_type);
        Self {
            name: name.into(),
            column_type,
            limit,
            precision: limit.filter(|_| scale.is_some() || column_type == ColumnType::Decimal),
            scale,
            sql_type,
            null: true,
            default: None,
            primary: false,
        }
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn is_lob(&self) -> bool {
        let upper = self.sql_type.to_ascii_uppercase();
        upper.ends_with("LOB") || upper.contains("LOB(")
    }

    /// Casts a value to this column's semantic type.
    ///
    /// Values already in the target representation come back unchanged, so
    /// casting twice equals casting once.
    pub fn cast(&self, value: &Value) -> Value {
        cast_value(self.column_type, value)
    }
}

/// Generic cast shared by every dialect.
pub fn cast_value(column_type: ColumnType, value: &Value) -> Value {
    if value.is_null() || value.is_literal() {
        return value.clone();
    }
    match column_type {
        ColumnType::String | ColumnType::Text => match value {
            Value::String(_) => value.clone(),
            other => other.to_text().map(Value::String).unwrap_or(Value::Null),
        },
        ColumnType::Integer | ColumnType::PrimaryKey => match value {
            Value::Integer(_) => value.clone(),
            Value::Bool(b) => Value::Integer(i64::from(*b)),
            Value::Float(f) => Value::Integer(f.trunc() as i64),
            Value::String(s) | Value::Decimal(s) => Value::Integer(leading_integer(s)),
            _ => Value::Null,
        },
        ColumnType::Float => match value {
            Value::Float(_) => value.clone(),
            Value::Integer(i) => Value::Float(*i as f64),
            Value::Bool(b) => Value::Float(if *b { 1.0 } else { 0.0 }),
            Value::String(s) | Value::Decimal(s) => Value::Float(s.trim().parse().unwrap_or(0.0)),
            _ => Value::Null,
        },
        ColumnType::Decimal => match value {
            Value::Decimal(_) => value.clone(),
            Value::Integer(i) => Value::Decimal(i.to_string()),
            Value::Float(f) => Value::Decimal(f.to_string()),
            Value::String(s) => Value::Decimal(s.trim().to_string()),
            Value::Bool(b) => Value::Decimal(i64::from(*b).to_string()),
            _ => Value::Null,
        },
        ColumnType::DateTime | ColumnType::Timestamp => match value {
            Value::DateTime(_) => value.clone(),
            Value::Date(d) => d.and_hms_opt(0, 0, 0).map(Value::DateTime).unwrap_or(Value::Null),
            Value::String(s) => parse_datetime(s).map(Value::DateTime).unwrap_or(Value::Null),
            _ => Value::Null,
        },
        ColumnType::Date => match value {
            Value::Date(_) => value.clone(),
            Value::DateTime(dt) => Value::Date(dt.date()),
            Value::String(s) => parse_date(s)
                .or_else(|| parse_datetime(s).map(|dt| dt.date()))
                .map(Value::Date)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        ColumnType::Time => match value {
            Value::Time(_) => value.clone(),
            Value::DateTime(dt) => Value::Time(dt.time()),
            Value::String(s) => parse_time(s).map(Value::Time).unwrap_or(Value::Null),
            _ => Value::Null,
        },
        ColumnType::Binary => match value {
            Value::Binary(_) => value.clone(),
            other => other
                .to_text()
                .map(|t| Value::Binary(t.into_bytes()))
                .unwrap_or(Value::Null),
        },
        ColumnType::Boolean => match value {
            Value::Bool(_) => value.clone(),
            Value::Integer(i) => Value::Bool(*i == 1),
            Value::String(s) | Value::Decimal(s) => Value::Bool(matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "t" | "true" | "y" | "yes"
            )),
            _ => Value::Bool(false),
        },
    }
}

/// Generic native-declaration classification.
pub fn simplified_type(sql_type: &str) -> ColumnType {
    let t = sql_type.to_ascii_lowercase();
    if t.contains("int") {
        ColumnType::Integer
    } else if t.contains("float") || t.contains("double") {
        ColumnType::Float
    } else if t.contains("decimal") || t.contains("numeric") || t.contains("number") {
        if extract_scale(sql_type) == Some(0) {
            ColumnType::Integer
        } else {
            ColumnType::Decimal
        }
    } else if t.contains("datetime") {
        ColumnType::DateTime
    } else if t.contains("timestamp") {
        ColumnType::Timestamp
    } else if t.contains("time") {
        ColumnType::Time
    } else if t.contains("date") {
        ColumnType::Date
    } else if t.contains("clob") || t.contains("text") {
        ColumnType::Text
    } else if t.contains("blob") || t.contains("binary") {
        ColumnType::Binary
    } else if t.contains("bool") {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

/// Scale of a `NUMERIC/DECIMAL/NUMBER(p[,s])` declaration; `(p)` alone is scale 0.
pub fn extract_scale(sql_type: &str) -> Option<u32> {
    let caps = NUMERIC_SCALE.captures(sql_type)?;
    match caps.get(1) {
        Some(scale) => scale.as_str().parse().ok(),
        None => Some(0),
    }
}

fn extract_limit_and_scale(sql_type: &str) -> (Option<u32>, Option<u32>) {
    match LIMIT.captures(sql_type) {
        Some(caps) => (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    }
}

fn leading_integer(text: &str) -> i64 {
    LEADING_INT
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}
