//! SQLite value conversion functions.
//!
//! Pure functions for converting between SQLite values and store rows.
//! These are testable in isolation without database access.

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};

use playerbound_core::entity::KeyValue;
use playerbound_core::storage::{ColumnKind, ColumnSpec, FieldValue, Row, TableSpec};

/// Format a DateTime<Utc> for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_datetime(index: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

/// Converts a row field to a bindable SQLite value.
pub fn field_to_value(field: &FieldValue) -> Value {
    match field {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(v) => Value::Integer(*v),
        FieldValue::Text(v) => Value::Text(v.clone()),
        FieldValue::Timestamp(v) => Value::Text(format_datetime(v)),
    }
}

/// Converts a key component to a bindable SQLite value.
pub fn key_to_value(key: &KeyValue) -> Value {
    field_to_value(&FieldValue::from(key))
}

/// Values for every column of `table` in declaration order; absent columns bind NULL.
pub fn row_values(table: &TableSpec, row: &Row) -> Vec<Value> {
    table
        .columns
        .iter()
        .map(|c| row.get(c.name).map_or(Value::Null, field_to_value))
        .collect()
}

/// Values for the non-key columns of `table` in declaration order.
pub fn non_key_values(table: &TableSpec, row: &Row) -> Vec<Value> {
    table
        .non_key_columns()
        .map(|c| row.get(c.name).map_or(Value::Null, field_to_value))
        .collect()
}

/// Human-readable key of `row`, used in error messages.
pub fn row_key(table: &TableSpec, row: &Row) -> String {
    table
        .key
        .iter()
        .map(|column| match row.get(column) {
            Some(FieldValue::Integer(v)) => v.to_string(),
            Some(FieldValue::Text(v)) => v.clone(),
            Some(FieldValue::Timestamp(v)) => format_datetime(v),
            Some(FieldValue::Null) | None => "null".to_string(),
        })
        .collect::<Vec<_>>()
        .join(":")
}

/// Reads a SQLite row whose columns are `columns`, in order.
pub fn read_row(columns: &'static [ColumnSpec], sql_row: &rusqlite::Row) -> rusqlite::Result<Row> {
    let mut row = Row::new();
    for (index, column) in columns.iter().enumerate() {
        let value = match column.kind {
            ColumnKind::Integer => sql_row
                .get::<_, Option<i64>>(index)?
                .map_or(FieldValue::Null, FieldValue::Integer),
            ColumnKind::Text => sql_row
                .get::<_, Option<String>>(index)?
                .map_or(FieldValue::Null, FieldValue::Text),
            ColumnKind::Timestamp => match sql_row.get::<_, Option<String>>(index)? {
                Some(text) => FieldValue::Timestamp(parse_datetime(index, &text)?),
                None => FieldValue::Null,
            },
        };
        row.push(column.name, value);
    }
    Ok(row)
}
