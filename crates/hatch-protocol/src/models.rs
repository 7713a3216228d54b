use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// MCP protocol revision spoken by Hatch servers
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version tag carried by every message
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes, plus the MCP resource code
pub mod error_codes {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i64 = -32700;
    /// The JSON sent is not a valid request object
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not exist or is not available
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal JSON-RPC error
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Requested resource URI is unknown (MCP extension)
    pub const RESOURCE_NOT_FOUND: i64 = -32002;
}

/// Identity reported by a server during `initialize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

/// Definition of an MCP (Model Context Protocol) tool
///
/// Tools are functions that can be called by the LLM to perform actions
/// or retrieve information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MCPToolDefinition {
    /// Unique name of the tool
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    pub input_schema: Value,
}

impl MCPToolDefinition {
    /// Create a tool definition with an explicit input schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Create a tool definition whose input schema is derived from `T`
    pub fn for_args<T: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let schema = schemars::schema_for!(T);
        let input_schema =
            serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }));
        Self::new(name, description, input_schema)
    }
}

/// Definition of a readable MCP resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MCPResourceDefinition {
    /// Resource URI (e.g. `citation://origin/my-server`)
    pub uri: String,
    /// Human-readable name
    pub name: String,
    /// What the resource contains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Text contents returned by `resources/read`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// URI the contents were read from
    pub uri: String,
    /// MIME type of `text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Resource body
    pub text: String,
}

/// A JSON-RPC 2.0 request or notification
///
/// A message without `id` is a notification and must not be answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol tag, always `"2.0"`
    pub jsonrpc: String,
    /// Request id; absent for notifications. An explicit `null` is kept as
    /// `Some(Value::Null)` and still gets a response.
    #[serde(
        default,
        deserialize_with = "deserialize_present_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn deserialize_present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    /// Build a request with the given id
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Build a notification (no id, no response expected)
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Whether this message is a notification
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error object of a failed JSON-RPC call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code, see [`error_codes`]
    pub code: i64,
    /// Short description
    pub message: String,
    /// Optional structured detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create an error without data
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response; exactly one of `result` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol tag, always `"2.0"`
    pub jsonrpc: String,
    /// Id of the request being answered (`null` when it could not be read)
    pub id: Value,
    /// Successful result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Whether the response carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Content block of a `tools/call` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text output
    Text {
        /// The text
        text: String,
    },
}

/// Result payload of `tools/call`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Output blocks
    pub content: Vec<ToolContent>,
    /// Whether the tool reported a failure
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Successful single-text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Failed single-text result
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tool_definition_uses_camel_case_schema_key() {
        let def = MCPToolDefinition::new("echo", "Echo input", json!({ "type": "object" }));
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "echo",
                "description": "Echo input",
                "inputSchema": { "type": "object" }
            })
        );
    }

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct GreetArgs {
        who: String,
        times: Option<u32>,
    }

    #[test]
    fn derived_schema_lists_required_fields() {
        let def = MCPToolDefinition::for_args::<GreetArgs>("greet", "Say hello");
        assert_eq!(def.input_schema["type"], "object");
        assert_eq!(def.input_schema["required"], json!(["who"]));
        assert!(def.input_schema["properties"].get("times").is_some());
    }

    #[test]
    fn request_without_id_is_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(req.is_notification());
        assert!(req.params.is_none());
    }

    #[test]
    fn null_id_is_not_a_notification() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(!req.is_notification());
        assert_eq!(req.id, Some(Value::Null));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "jsonrpc": "2.0", "id": null, "method": "ping" })
        );
    }

    #[test]
    fn failure_response_omits_result() {
        let resp = JsonRpcResponse::failure(
            json!(7),
            JsonRpcError::new(error_codes::METHOD_NOT_FOUND, "Method not found: nope"),
        );
        assert!(resp.is_error());
        assert!(!JsonRpcResponse::success(json!(7), json!({})).is_error());
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn call_tool_result_is_tagged() {
        let value = serde_json::to_value(CallToolResult::error("boom")).unwrap();
        assert_eq!(
            value,
            json!({ "content": [{ "type": "text", "text": "boom" }], "isError": true })
        );
    }
}
