// Data-access core for the Teller gateway: guarded SQL execution, catalog
// introspection, and blob preview extraction over per-call connections.

pub mod blob;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod query;
pub mod schema;
pub mod types;

pub use credentials::{CredentialProvider, Credentials, EnvCredentials, StaticCredentials};
pub use error::{GatewayError, GatewayResult};
pub use types::*;
