// Cross-zone relay: forwards tool invocations to a remote gateway while
// preserving caller-identifying context.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use teller_mcp::protocol::{CallerContext, CLIENT_CONTEXT_HEADER};

/// Environment variable holding the remote gateway invoke endpoint.
pub const RELAY_TARGET_VAR: &str = "TELLER_RELAY_TARGET";

/// Errors raised by the forwarding hop.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The remote invocation failed at the transport level.
    #[error("Forwarding failed: {0}")]
    Forwarding(#[from] reqwest::Error),

    /// The configured target is not a usable URL.
    #[error("Invalid relay target: {0}")]
    Target(#[from] url::ParseError),
}

/// Forwards calls verbatim to a remote dispatcher endpoint.
///
/// The hop is thin and stateless: one synchronous request/response per
/// call, no retry, no timeout beyond the transport default, and no
/// interpretation of the payload.
pub struct Relay {
    client: reqwest::Client,
    target: url::Url,
}

impl Relay {
    pub fn new(target_url: &str) -> Result<Self, RelayError> {
        let target = url::Url::parse(target_url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("teller-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, target })
    }

    /// Relay one call to the remote dispatcher and return its response
    /// unmodified.
    ///
    /// The caller context rides in a transport header as base64-encoded
    /// JSON so the remote dispatcher can still resolve the tool name from
    /// it. If the context cannot be encoded the forward proceeds without
    /// it; a transport failure is propagated as-is, since this hop has no
    /// policy knowledge of a safe fallback.
    pub async fn forward(
        &self,
        body: &Value,
        context: Option<&CallerContext>,
    ) -> Result<Value, RelayError> {
        let mut request = self.client.post(self.target.clone()).json(body);

        if let Some(context) = context {
            match context.to_header() {
                Some(header) => {
                    request = request.header(CLIENT_CONTEXT_HEADER, header);
                }
                None => {
                    tracing::warn!("caller context could not be encoded; forwarding without it");
                }
            }
        }

        let response = request.send().await?;
        Ok(response.json().await?)
    }
}

/// Relay configuration: TOML file, serde defaults, environment fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub forward: ForwardSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwardSection {
    /// Remote gateway invoke endpoint; falls back to
    /// `TELLER_RELAY_TARGET` when unset.
    #[serde(default)]
    pub target_url: Option<String>,

    /// Label of the zone the target runs in, for logs only.
    #[serde(default)]
    pub remote_zone: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl RelayConfig {
    /// Load from a TOML file, using defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve the forwarding target, preferring the file over the
    /// environment.
    pub fn target_url(&self) -> Result<String> {
        if let Some(url) = &self.forward.target_url {
            return Ok(url.clone());
        }
        std::env::var(RELAY_TARGET_VAR)
            .with_context(|| format!("No relay target configured and {} is not set", RELAY_TARGET_VAR))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use teller_mcp::protocol::CONTEXT_TOOL_NAME_KEY;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context_with_tool(name: &str) -> CallerContext {
        let mut context = CallerContext::default();
        context
            .custom
            .insert(CONTEXT_TOOL_NAME_KEY.to_string(), json!(name));
        context
    }

    #[tokio::test]
    async fn forwards_the_body_verbatim_and_returns_the_response_unmodified() {
        let server = MockServer::start().await;
        let call = json!({"name": "get_schema_info", "arguments": {"table_name": "customers"}});
        let remote_response = json!({
            "content": [{"type": "text", "text": "{\"tables\": [\"customers\"]}"}],
            "isError": false
        });

        Mock::given(method("POST"))
            .and(path("/invoke"))
            .and(body_json(&call))
            .respond_with(ResponseTemplate::new(200).set_body_json(&remote_response))
            .expect(1)
            .mount(&server)
            .await;

        let relay = Relay::new(&format!("{}/invoke", server.uri())).unwrap();
        let response = relay.forward(&call, None).await.unwrap();
        assert_eq!(response, remote_response);
    }

    #[tokio::test]
    async fn attaches_the_caller_context_header() {
        let server = MockServer::start().await;
        let context = context_with_tool("ns___execute_sql_query");
        let expected_header = context.to_header().unwrap();

        Mock::given(method("POST"))
            .and(header(CLIENT_CONTEXT_HEADER, expected_header.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let relay = Relay::new(&server.uri()).unwrap();
        let response = relay
            .forward(&json!({"query": "SELECT 1"}), Some(&context))
            .await
            .unwrap();
        assert_eq!(response["ok"], true);
    }

    #[tokio::test]
    async fn missing_context_still_forwards() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let relay = Relay::new(&server.uri()).unwrap();
        let response = relay.forward(&json!({}), None).await.unwrap();
        assert_eq!(response["ok"], true);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        // Nothing listens here.
        let relay = Relay::new("http://127.0.0.1:1/invoke").unwrap();
        let err = relay.forward(&json!({}), None).await.unwrap_err();
        assert!(matches!(err, RelayError::Forwarding(_)));
    }

    #[tokio::test]
    async fn undecodable_remote_body_is_a_forwarding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let relay = Relay::new(&server.uri()).unwrap();
        let err = relay.forward(&json!({}), None).await.unwrap_err();
        assert!(matches!(err, RelayError::Forwarding(_)));
    }

    #[test]
    fn rejects_malformed_targets() {
        assert!(matches!(Relay::new("not a url"), Err(RelayError::Target(_))));
    }

    #[test]
    fn config_prefers_the_file_over_the_environment() {
        let config = RelayConfig {
            forward: ForwardSection {
                target_url: Some("https://gateway.internal/invoke".to_string()),
                remote_zone: Some("me-south-1".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(config.target_url().unwrap(), "https://gateway.internal/invoke");
    }

    #[test]
    fn config_loads_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(
            &path,
            "[forward]\ntarget_url = \"https://gw.example.com/invoke\"\nremote_zone = \"me-south-1\"\n",
        )
        .unwrap();

        let config = RelayConfig::load(&path).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.forward.remote_zone.as_deref(), Some("me-south-1"));
    }
}
