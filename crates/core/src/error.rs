//! Error types for the Teller data-access core.

/// Result type for data-access operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur inside the data-access capabilities.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Statement refused by the read-only safety guard.
    #[error("Blocked: {keyword} statements not allowed. Read-only access.")]
    Blocked { keyword: &'static str },

    /// The store rejected or failed the statement.
    #[error("Query failed: {0}")]
    Query(String),

    /// A table or column name contains characters outside [A-Za-z0-9_].
    #[error("Invalid table/column name: {0}")]
    InvalidIdentifier(String),

    /// Blob lookup matched no row, or the cell was NULL/empty.
    #[error("No blob data found for {id_column}={row_id}")]
    NotFound { id_column: String, row_id: i64 },

    /// Credential resolution or connection establishment failed.
    #[error("Credentials error: {0}")]
    Credentials(String),
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::Query(err.to_string())
    }
}
