// Blob extraction: fetch one binary cell, sniff its format, derive a
// bounded text preview.

use crate::error::{GatewayError, GatewayResult};
use crate::types::{BlobPreview, ContentKind, MAX_PREVIEW_CHARS};
use sqlx::{Row, SqliteConnection};

/// How many leading bytes the hex dump of an unknown binary covers.
const HEX_DUMP_BYTES: usize = 100;

/// Reject identifiers that cannot be safely interpolated into a statement.
///
/// Table and column names arrive from the caller and are spliced into the
/// generated statement (only the row id is a bound parameter), so anything
/// outside [A-Za-z0-9_] is refused before the store is touched.
pub fn validate_identifier(name: &str) -> GatewayResult<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GatewayError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Fetch the blob at `(id_column = row_id)` from `table.blob_column` and
/// derive its preview.
///
/// Extraction never fails on malformed bytes: every sniffing and decoding
/// step has a fallback, down to a generic byte-count description.
pub async fn extract(
    conn: &mut SqliteConnection,
    table: &str,
    blob_column: &str,
    row_id: i64,
    id_column: &str,
) -> GatewayResult<BlobPreview> {
    validate_identifier(table)?;
    validate_identifier(blob_column)?;
    validate_identifier(id_column)?;

    let statement = format!(
        "SELECT \"{}\" FROM \"{}\" WHERE \"{}\" = ?1",
        blob_column, table, id_column
    );
    let row = sqlx::query(&statement)
        .bind(row_id)
        .fetch_optional(&mut *conn)
        .await?;

    let blob: Vec<u8> = row
        .and_then(|r| r.try_get::<Option<Vec<u8>>, _>(0).ok().flatten())
        .unwrap_or_default();
    if blob.is_empty() {
        return Err(GatewayError::NotFound {
            id_column: id_column.to_string(),
            row_id,
        });
    }

    let (kind, preview) = sniff_and_preview(&blob);
    tracing::debug!(content_type = kind.label(), size = blob.len(), "blob sniffed");
    Ok(BlobPreview {
        row_id,
        content_type: kind.label().to_string(),
        size_bytes: blob.len(),
        preview,
    })
}

/// Infer the format from leading bytes and derive the format-specific
/// preview.
fn sniff_and_preview(blob: &[u8]) -> (ContentKind, String) {
    if blob.starts_with(b"%PDF") {
        return (ContentKind::Pdf, pdf_preview(blob));
    }
    if blob.starts_with(b"PK") {
        return (
            ContentKind::Office,
            format!("Office document, {} bytes", blob.len()),
        );
    }
    match std::str::from_utf8(blob) {
        Ok(text) => (
            ContentKind::Text,
            text.chars().take(MAX_PREVIEW_CHARS).collect(),
        ),
        Err(_) => {
            let dump = hex::encode(&blob[..blob.len().min(HEX_DUMP_BYTES)]);
            (
                ContentKind::Unknown,
                format!(
                    "Binary data, {} bytes, first {} hex: {}",
                    blob.len(),
                    HEX_DUMP_BYTES,
                    dump
                ),
            )
        }
    }
}

/// Best-effort text harvest from a PDF byte stream.
///
/// The whole blob is decoded as Latin-1 (a lossless byte-to-codepoint
/// mapping, since PDFs interleave binary and ASCII), then the text-object
/// segments between `BT` and `ET` markers are concatenated. Streams with
/// no such markers fall back to the leading decoded characters. This is a
/// heuristic, not a PDF parser.
fn pdf_preview(blob: &[u8]) -> String {
    let text: String = blob.iter().map(|&b| b as char).collect();

    let mut segments = Vec::new();
    for chunk in text.split("BT") {
        if let Some(end) = chunk.find("ET") {
            segments.push(&chunk[..end]);
        }
    }

    if segments.is_empty() {
        text.chars().take(MAX_PREVIEW_CHARS).collect()
    } else {
        let joined = segments.join(" ");
        joined.chars().take(MAX_PREVIEW_CHARS).collect()
    }
}
