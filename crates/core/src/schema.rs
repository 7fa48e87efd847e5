// Catalog introspection for agent-driven schema discovery.

use crate::error::GatewayResult;
use crate::types::{ColumnInfo, SchemaInfo};
use sqlx::{Row, SqliteConnection};

/// List every base table in the connected catalog, ordered by name.
///
/// Views and the store's own bookkeeping tables are excluded.
pub async fn list_tables(conn: &mut SqliteConnection) -> GatewayResult<SchemaInfo> {
    let rows = sqlx::query(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in &rows {
        tables.push(row.try_get("name")?);
    }
    Ok(SchemaInfo::Tables { tables })
}

/// Describe one table: every column in ordinal position order, plus the
/// primary-key column set.
///
/// A table that does not exist yields an empty column list rather than an
/// error; the caller infers non-existence from emptiness.
pub async fn describe_table(
    conn: &mut SqliteConnection,
    table: &str,
) -> GatewayResult<SchemaInfo> {
    let rows = sqlx::query(
        "SELECT name, type, \"notnull\", dflt_value, pk \
         FROM pragma_table_info(?1) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;

    let mut columns = Vec::with_capacity(rows.len());
    let mut key_columns: Vec<(i64, String)> = Vec::new();
    for row in &rows {
        let name: String = row.try_get("name")?;
        let column_type: String = row.try_get("type")?;
        let notnull: i64 = row.try_get("notnull")?;
        let default: Option<String> = row.try_get("dflt_value")?;
        let pk: i64 = row.try_get("pk")?;

        if pk > 0 {
            key_columns.push((pk, name.clone()));
        }
        columns.push(ColumnInfo {
            name,
            column_type,
            nullable: notnull == 0,
            default,
        });
    }

    // pk holds the 1-based position within a composite key.
    key_columns.sort_by_key(|(position, _)| *position);
    let primary_keys = key_columns.into_iter().map(|(_, name)| name).collect();

    Ok(SchemaInfo::Table {
        table: table.to_string(),
        columns,
        primary_keys,
    })
}
