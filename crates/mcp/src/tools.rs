// The closed tool registry: three data-access capabilities.

use crate::protocol::ToolSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

/// The fixed set of capabilities this gateway exposes.
///
/// A closed enum rather than a name-keyed map: resolution happens exactly
/// once, and every dispatch site matches exhaustively, so an unknown name
/// can never reach a handler and a known name can never arrive with the
/// wrong argument shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ExecuteSqlQuery,
    GetSchemaInfo,
    AnalyzeBlobData,
}

impl ToolKind {
    pub const ALL: [Self; 3] = [
        Self::ExecuteSqlQuery,
        Self::GetSchemaInfo,
        Self::AnalyzeBlobData,
    ];

    /// Resolve a bare tool name to its registered capability.
    pub fn resolve(name: &str) -> Option<Self> {
        match name {
            "execute_sql_query" => Some(Self::ExecuteSqlQuery),
            "get_schema_info" => Some(Self::GetSchemaInfo),
            "analyze_blob_data" => Some(Self::AnalyzeBlobData),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ExecuteSqlQuery => "execute_sql_query",
            Self::GetSchemaInfo => "get_schema_info",
            Self::AnalyzeBlobData => "analyze_blob_data",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ExecuteSqlQuery => {
                "Execute read-only SQL queries on the banking database. Returns structured results."
            }
            Self::GetSchemaInfo => {
                "Get database schema info: list tables, or get columns/types for a specific table."
            }
            Self::AnalyzeBlobData => {
                "Extract and analyze unstructured data from binary blob columns (PDFs, documents)."
            }
        }
    }

    /// The discovery descriptor for this capability.
    pub fn schema(self) -> ToolSchema {
        let input_schema = match self {
            Self::ExecuteSqlQuery => json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("SQL SELECT query to execute"),
                    "parameters": {
                        "type": "object",
                        "description": "Query parameters for parameterized queries"
                    }
                }),
                vec!["query"],
            ),
            Self::GetSchemaInfo => json_schema_object(
                serde_json::json!({
                    "database_name": json_schema_string("Database name (informational; the connected catalog is fixed)"),
                    "table_name": json_schema_string("Table name to get columns for. Omit to list all tables.")
                }),
                vec![],
            ),
            Self::AnalyzeBlobData => json_schema_object(
                serde_json::json!({
                    "table": json_schema_string("Table containing the blob column"),
                    "blob_column": json_schema_string("Name of the binary column"),
                    "row_id": json_schema_integer("Row ID to extract the blob from"),
                    "id_column": json_schema_string("Name of the ID column (default: id)")
                }),
                vec!["table", "blob_column", "row_id"],
            ),
        };

        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema,
        }
    }
}

/// Arguments for `execute_sql_query`.
#[derive(Debug, Deserialize)]
pub struct ExecuteSqlArgs {
    pub query: String,
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
}

/// Arguments for `get_schema_info`.
#[derive(Debug, Deserialize)]
pub struct SchemaInfoArgs {
    /// Accepted for caller compatibility; the connected catalog is fixed
    /// by configuration.
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
}

/// Arguments for `analyze_blob_data`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeBlobArgs {
    pub table: String,
    pub blob_column: String,
    pub row_id: i64,
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

fn default_id_column() -> String {
    "id".to_string()
}

// Helpers for building tool input schemas.

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}
