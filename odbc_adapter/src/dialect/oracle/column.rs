//! Oracle column semantics: type classification, default clean-up and casting.

use crate::types::column::{cast_value, extract_scale};
use crate::types::value::parse_datetime;
use crate::types::{ColumnDescriptor, ColumnType, Value};
use chrono::{NaiveDateTime, Timelike};

lazy_static::lazy_static! {
    static ref BOOLEAN_NUMBER: regex::Regex =
        regex::Regex::new(r"(?i)^number\(1\)$").expect("valid boolean number regex");
}

/// Classifies an Oracle declaration. `None` when nothing applies.
pub fn simplified_type(sql_type: &str) -> Option<ColumnType> {
    let t = sql_type.trim().to_ascii_lowercase();
    if BOOLEAN_NUMBER.is_match(&t) {
        Some(ColumnType::Boolean)
    } else if t.contains("char") {
        Some(ColumnType::String)
    } else if t.contains("float") || t.contains("double") {
        Some(ColumnType::Float)
    } else if t.contains("int") {
        Some(ColumnType::Integer)
    } else if t.contains("num") || t.contains("dec") || t.contains("real") {
        if extract_scale(&t) == Some(0) {
            Some(ColumnType::Integer)
        } else {
            Some(ColumnType::Decimal)
        }
    } else if t.contains("date") || t.contains("time") {
        Some(ColumnType::DateTime)
    } else if t.contains("clob") {
        Some(ColumnType::Text)
    } else if t.contains("blob") {
        Some(ColumnType::Binary)
    } else {
        None
    }
}

/// Semantic type of a catalog column; a primary key declared plain `NUMBER` is integer.
pub fn column_type(sql_type: &str, primary: bool) -> ColumnType {
    if primary && sql_type.trim().eq_ignore_ascii_case("NUMBER") {
        return ColumnType::Integer;
    }
    simplified_type(sql_type).unwrap_or(ColumnType::String)
}

/// Catalog defaults arrive padded and quoted; `null` and `sysdate` mean none.
pub fn default_value(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value == "null" || value.eq_ignore_ascii_case("sysdate") {
        return None;
    }
    match value
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) => Some(inner.to_string()),
        None => Some(value.to_string()),
    }
}

pub fn type_cast(value: &Value, column: &ColumnDescriptor) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match column.column_type {
        ColumnType::String | ColumnType::Text => object_to_string(value),
        ColumnType::DateTime => string_to_time(value),
        other => cast_value(other, value),
    }
}

/// Text form Oracle accepts for VARCHAR2 and CLOB targets.
pub fn object_to_string(value: &Value) -> Value {
    match value {
        Value::Null | Value::String(_) | Value::Literal(_) => value.clone(),
        Value::Bool(true) => Value::String("1".to_string()),
        Value::Bool(false) => Value::String("0".to_string()),
        other => other.to_text().map(Value::String).unwrap_or(Value::Null),
    }
}

/// Parses a date-time and collapses it to a date when the time part is midnight.
pub fn string_to_time(value: &Value) -> Value {
    let parsed = match value {
        Value::Date(_) | Value::Literal(_) => return value.clone(),
        Value::DateTime(dt) => Some(*dt),
        Value::String(s) => parse_datetime(s),
        _ => None,
    };
    match parsed {
        Some(dt) => guess_date_or_time(dt),
        None => Value::Null,
    }
}

fn guess_date_or_time(dt: NaiveDateTime) -> Value {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        Value::Date(dt.date())
    } else {
        Value::DateTime(dt)
    }
}
