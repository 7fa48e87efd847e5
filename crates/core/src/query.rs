// Guarded query execution and transport sanitization.

use crate::error::GatewayResult;
use crate::guard;
use crate::types::{QueryResult, MAX_ROWS};
use serde_json::{Map, Number, Value};
use sqlx::sqlite::{SqliteArguments, SqliteColumn, SqliteRow};
use sqlx::{Column, Row, SqliteConnection, TypeInfo, ValueRef};

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

/// Execute a read statement and sanitize the result set for transport.
///
/// The safety guard runs first; `parameters` values are bound positionally
/// in insertion order. All matched rows are fetched, then the returned
/// sequence is capped at [`MAX_ROWS`] while `row_count` reports the true
/// total. Binary cells become `<BLOB n bytes>` placeholders and temporal
/// cells are rendered as ISO-8601 strings; raw bytes never cross this
/// boundary.
pub async fn execute(
    conn: &mut SqliteConnection,
    statement: &str,
    parameters: Option<&Map<String, Value>>,
) -> GatewayResult<QueryResult> {
    guard::check(statement)?;

    let mut query = sqlx::query(statement);
    if let Some(params) = parameters {
        for value in params.values() {
            query = bind_value(query, value);
        }
    }

    let fetched = query.fetch_all(&mut *conn).await?;
    let row_count = fetched.len();
    tracing::debug!(rows = row_count, "query fetched");
    let rows = fetched.iter().take(MAX_ROWS).map(sanitize_row).collect();

    Ok(QueryResult {
        row_count,
        rows,
        truncated: row_count > MAX_ROWS,
    })
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        // Arrays and objects have no SQL scalar form; bind their JSON text.
        other => query.bind(other.to_string()),
    }
}

fn sanitize_row(row: &SqliteRow) -> Map<String, Value> {
    let mut out = Map::new();
    for column in row.columns() {
        out.insert(column.name().to_string(), sanitize_value(row, column));
    }
    out
}

/// Convert one cell into a transport-safe scalar.
///
/// The declared column type picks the rendering; the actual stored value
/// decides NULL. SQLite typing is flexible, so every branch falls back to
/// [`decode_any`] when the stored value does not match the declaration.
fn sanitize_value(row: &SqliteRow, column: &SqliteColumn) -> Value {
    let index = column.ordinal();
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        Ok(_) => {}
    }

    match column.type_info().name() {
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(|bytes| Value::String(format!("<BLOB {} bytes>", bytes.len())))
            .unwrap_or_else(|_| decode_any(row, index)),
        "INTEGER" => row
            .try_get::<i64, _>(index)
            .map(|v| Value::Number(Number::from(v)))
            .unwrap_or_else(|_| decode_any(row, index)),
        "REAL" => row
            .try_get::<f64, _>(index)
            .map(|v| Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null))
            .unwrap_or_else(|_| decode_any(row, index)),
        "BOOLEAN" => row
            .try_get::<bool, _>(index)
            .map(Value::Bool)
            .unwrap_or_else(|_| decode_any(row, index)),
        "DATETIME" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or_else(|_| decode_any(row, index)),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(index)
            .map(|v| Value::String(v.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|_| decode_any(row, index)),
        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(index)
            .map(|v| Value::String(v.format("%H:%M:%S%.f").to_string()))
            .unwrap_or_else(|_| decode_any(row, index)),
        _ => decode_any(row, index),
    }
}

/// Fallback for NUMERIC and other loosely-typed cells: text first, so a
/// non-numeric value is never coerced to zero by the store's conversion
/// rules.
fn decode_any(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::String(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Value::Number(Number::from(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null);
    }
    if let Ok(bytes) = row.try_get::<Vec<u8>, _>(index) {
        return Value::String(format!("<BLOB {} bytes>", bytes.len()));
    }
    Value::Null
}
