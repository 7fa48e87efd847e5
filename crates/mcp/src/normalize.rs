// Normalization of heterogeneous invocation envelopes into one ToolCall.

use crate::protocol::{CallerContext, TOOL_NAME_DELIMITER};
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

/// Keys that route rather than parameterize; stripped from the resolved
/// argument mapping.
const ROUTING_KEYS: [&str; 4] = ["name", "toolName", "arguments", "input"];

/// A caller's resolved intent: one capability name plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Resolve tool name and arguments from any of the supported envelope
    /// shapes.
    ///
    /// The tool name comes from, in priority order: the caller context's
    /// namespaced entry, then an in-band `name`/`toolName` field. Either
    /// may be `<namespace>___<tool>`; only the suffix is kept. When the
    /// body carries an in-band name, arguments live under `arguments` or
    /// `input` (string-encoded JSON is parsed); otherwise the whole body
    /// is the argument mapping.
    pub fn resolve(body: &Value, context: Option<&CallerContext>) -> Result<Self> {
        let mut tool_name = context
            .and_then(CallerContext::tool_name)
            .map(strip_namespace)
            .unwrap_or_default();

        let in_band = body.get("name").or_else(|| body.get("toolName"));
        if tool_name.is_empty() {
            if let Some(raw) = in_band.and_then(Value::as_str) {
                tool_name = strip_namespace(raw);
            }
        }

        let raw_arguments = if in_band.is_some() {
            body.get("arguments")
                .or_else(|| body.get("input"))
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()))
        } else {
            body.clone()
        };

        let mut arguments = match raw_arguments {
            Value::String(encoded) => serde_json::from_str::<Map<String, Value>>(&encoded)
                .map_err(|e| anyhow!("Arguments are not valid JSON: {}", e))?,
            Value::Object(map) => map,
            other => return Err(anyhow!("Arguments must be an object, got: {}", other)),
        };
        for key in ROUTING_KEYS {
            arguments.remove(key);
        }

        Ok(Self {
            tool_name,
            arguments,
        })
    }
}

fn strip_namespace(raw: &str) -> String {
    match raw.rfind(TOOL_NAME_DELIMITER) {
        Some(index) => raw[index + TOOL_NAME_DELIMITER.len()..].to_string(),
        None => raw.to_string(),
    }
}
