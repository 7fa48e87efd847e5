use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of rows returned to the caller in one query result.
pub const MAX_ROWS: usize = 500;

/// Maximum preview length, in characters, for blob extraction.
pub const MAX_PREVIEW_CHARS: usize = 2000;

/// Sanitized result of a read query.
///
/// `row_count` is the true matched total; `rows` holds at most
/// [`MAX_ROWS`] entries, and every cell value is a transport-safe scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub row_count: usize,
    pub rows: Vec<Map<String, Value>>,
    pub truncated: bool,
}

/// A column as reported by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// Schema information: either a table listing or one table's detail,
/// never both in a single response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaInfo {
    Tables {
        tables: Vec<String>,
    },
    Table {
        table: String,
        columns: Vec<ColumnInfo>,
        primary_keys: Vec<String>,
    },
}

/// Sniffed blob format, inferred from leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Office,
    Text,
    Unknown,
}

impl ContentKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Office => "application/vnd.openxmlformats (docx/xlsx)",
            Self::Text => "application/octet-stream",
            Self::Unknown => "unknown",
        }
    }
}

/// Bounded textual glimpse of one binary cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobPreview {
    pub row_id: i64,
    pub content_type: String,
    pub size_bytes: usize,
    pub preview: String,
}
