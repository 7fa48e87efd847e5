// Credential resolution and per-call connection acquisition.

use crate::error::{GatewayError, GatewayResult};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, SqliteConnection};
use std::str::FromStr;

/// Environment variable holding the store connection URL.
pub const DATABASE_URL_VAR: &str = "TELLER_DATABASE_URL";

/// Connection material for the relational store.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub database_url: String,
}

impl Credentials {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Open a fresh connection.
    ///
    /// The caller owns the connection for exactly one gateway call and
    /// releases it before returning. There is no pooling and no caching
    /// at this layer.
    pub async fn connect(&self) -> GatewayResult<SqliteConnection> {
        let options = SqliteConnectOptions::from_str(&self.database_url)
            .map_err(|e| GatewayError::Credentials(e.to_string()))?;
        options
            .connect()
            .await
            .map_err(|e| GatewayError::Credentials(e.to_string()))
    }
}

/// Source of store credentials, consulted fresh for every call.
///
/// Caching and rotation policy belong to the provider; the gateway only
/// asks for the current credentials and opens one connection per call.
pub trait CredentialProvider: Send + Sync {
    fn current(&self) -> GatewayResult<Credentials>;
}

/// Provider backed by the `TELLER_DATABASE_URL` environment variable.
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn current(&self) -> GatewayResult<Credentials> {
        std::env::var(DATABASE_URL_VAR)
            .map(Credentials::new)
            .map_err(|_| GatewayError::Credentials(format!("{} is not set", DATABASE_URL_VAR)))
    }
}

/// Fixed credentials, for configuration files and tests.
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self(Credentials::new(database_url))
    }
}

impl CredentialProvider for StaticCredentials {
    fn current(&self) -> GatewayResult<Credentials> {
        Ok(self.0.clone())
    }
}
