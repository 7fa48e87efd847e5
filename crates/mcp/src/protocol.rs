// Invocation envelope types shared by the gateway and the relay.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Delimiter between the routing namespace and the bare tool name.
pub const TOOL_NAME_DELIMITER: &str = "___";

/// Caller-context key carrying the namespaced tool name.
pub const CONTEXT_TOOL_NAME_KEY: &str = "gatewayToolName";

/// Transport header carrying the base64-encoded caller context.
pub const CLIENT_CONTEXT_HEADER: &str = "x-teller-client-context";

/// Tool definition surfaced for discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result envelope for a dispatched tool call.
///
/// Every outcome, success or failure, is rendered through this envelope;
/// the dispatcher never answers with anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// Wrap a successful payload as serialized JSON text.
    pub fn success(payload: &impl Serialize) -> Self {
        match serde_json::to_string(payload) {
            Ok(text) => Self {
                content: vec![ToolContent::text(text)],
                is_error: false,
            },
            Err(e) => Self::error(format!("Serialization failed: {}", e)),
        }
    }

    /// Wrap an error message as the standard `{"error": ...}` payload.
    pub fn error(message: impl Into<String>) -> Self {
        let payload = serde_json::json!({ "error": message.into() });
        Self {
            content: vec![ToolContent::text(payload.to_string())],
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Opaque caller-supplied routing metadata.
///
/// Relayed without interpretation except for extracting the namespaced
/// tool name from [`CONTEXT_TOOL_NAME_KEY`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallerContext {
    #[serde(default)]
    pub custom: Map<String, Value>,
    #[serde(default)]
    pub env: Map<String, Value>,
}

impl CallerContext {
    /// Decode from the base64 JSON transport header value.
    pub fn from_header(value: &str) -> Option<Self> {
        let bytes = BASE64.decode(value).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Encode for the transport header.
    pub fn to_header(&self) -> Option<String> {
        serde_json::to_vec(self).ok().map(|bytes| BASE64.encode(bytes))
    }

    /// The namespaced tool name, if the caller supplied one.
    pub fn tool_name(&self) -> Option<&str> {
        self.custom.get(CONTEXT_TOOL_NAME_KEY).and_then(Value::as_str)
    }
}
