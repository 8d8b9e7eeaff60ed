use crate::error::{AdapterError, Result};
use crate::types::value::{parse_date, parse_datetime, parse_time};
use crate::types::Value;
use odbc_api::{CursorRow, DataType};

/// How a result column is materialised into a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Integer,
    Float,
    Decimal,
    Bool,
    Date,
    DateTime,
    Time,
    Binary,
}

impl CellKind {
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Integer | DataType::SmallInt | DataType::TinyInt | DataType::BigInt => {
                CellKind::Integer
            }
            DataType::Bit => CellKind::Bool,
            DataType::Numeric { scale: 0, .. } | DataType::Decimal { scale: 0, .. } => {
                CellKind::Integer
            }
            DataType::Numeric { .. } | DataType::Decimal { .. } => CellKind::Decimal,
            DataType::Float { .. } | DataType::Real | DataType::Double => CellKind::Float,
            DataType::Date => CellKind::Date,
            DataType::Timestamp { .. } => CellKind::DateTime,
            DataType::Time { .. } => CellKind::Time,
            DataType::Binary { .. }
            | DataType::Varbinary { .. }
            | DataType::LongVarbinary { .. } => CellKind::Binary,
            _ => CellKind::Text,
        }
    }
}

pub fn read_cell(row: &mut CursorRow<'_>, column_number: u16, kind: CellKind) -> Result<Value> {
    if kind == CellKind::Binary {
        let mut buf: Vec<u8> = Vec::new();
        let has_value = row
            .get_binary(column_number, &mut buf)
            .map_err(AdapterError::from)?;
        return Ok(if has_value { Value::Binary(buf) } else { Value::Null });
    }

    let mut buf: Vec<u8> = Vec::new();
    let has_value = row
        .get_text(column_number, &mut buf)
        .map_err(AdapterError::from)?;
    if !has_value {
        return Ok(Value::Null);
    }
    let text = String::from_utf8_lossy(&buf).to_string();
    Ok(text_to_value(text, kind))
}

/// Types driver text; anything that fails to parse stays textual.
pub fn text_to_value(text: String, kind: CellKind) -> Value {
    let trimmed = text.trim();
    match kind {
        CellKind::Integer => match trimmed.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Decimal(trimmed.to_string()),
        },
        CellKind::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::String(text)),
        CellKind::Decimal => Value::Decimal(trimmed.to_string()),
        CellKind::Bool => match trimmed {
            "1" => Value::Bool(true),
            "0" => Value::Bool(false),
            _ => Value::String(text),
        },
        CellKind::Date => parse_date(trimmed)
            .map(Value::Date)
            .unwrap_or(Value::String(text)),
        CellKind::DateTime => parse_datetime(trimmed)
            .map(Value::DateTime)
            .unwrap_or(Value::String(text)),
        CellKind::Time => parse_time(trimmed)
            .map(Value::Time)
            .unwrap_or(Value::String(text)),
        CellKind::Text | CellKind::Binary => Value::String(text),
    }
}
