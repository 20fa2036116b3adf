//! SQLite row to JSON conversion.

use base64::Engine;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Converts a row into a column name → value object.
///
/// Values are decoded by their storage class, so expression columns without a
/// declared type convert too. BLOBs become base64 strings.
pub fn row_to_json(row: &SqliteRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), cell_to_json(row, column.ordinal())))
        .collect()
}

/// Column names of a row, in select order.
pub fn column_names(row: &SqliteRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

fn cell_to_json(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(Value::from).unwrap_or(Value::Null),
        "REAL" => row.try_get::<f64, _>(index).map(Value::from).unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|bytes| Value::String(base64::engine::general_purpose::STANDARD.encode(bytes)))
            .unwrap_or(Value::Null),
        _ => row.try_get::<String, _>(index).map(Value::String).unwrap_or(Value::Null),
    }
}
