//! A minimal MCP server: JSON-RPC dispatch over tool and resource registries,
//! served as newline-delimited JSON on any async byte stream.

use crate::registry::{ResourceError, ResourceRegistry, ToolError, ToolRegistry};
use hatch_protocol::models::{
    error_codes, CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo,
    JSONRPC_VERSION, PROTOCOL_VERSION,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// An MCP server exposing registered tools and resources.
///
/// Clones share the same registries.
#[derive(Clone)]
pub struct McpServer {
    info: ServerInfo,
    instructions: Option<String>,
    tools: ToolRegistry,
    resources: ResourceRegistry,
}

impl McpServer {
    /// Create a server with empty registries, versioned with this package
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: crate::VERSION.to_string(),
            },
            instructions: None,
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(),
        }
    }

    /// Override the version reported in `initialize`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.info.version = version.into();
        self
    }

    /// Usage instructions reported to clients in `initialize`
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Server identity
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Resource registry
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Handle one decoded message. Notifications yield `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    error_codes::INVALID_REQUEST,
                    format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                ),
            ));
        }

        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                debug!(method = %request.method, %error, "Request failed");
                JsonRpcResponse::failure(id, error)
            }
        };
        Some(response)
    }

    /// Handle one raw line of input
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Discarding unparseable message");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(error_codes::PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(error_codes::INVALID_REQUEST, format!("Invalid request: {}", e)),
            )),
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.list_tools().await })),
            "tools/call" => self.call_tool(params).await,
            "resources/list" => Ok(json!({ "resources": self.resources.list_resources().await })),
            "resources/read" => self.read_resource(params).await,
            other => Err(JsonRpcError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }

    fn initialize_result(&self) -> Value {
        let mut result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": self.info,
        });
        if let Some(instructions) = &self.instructions {
            result["instructions"] = json!(instructions);
        }
        result
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        let args = params.arguments.unwrap_or_else(|| json!({}));

        let result = match self.tools.call_tool(&params.name, args).await {
            Ok(Value::String(text)) => CallToolResult::text(text),
            Ok(value) => CallToolResult::text(
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
            ),
            Err(ToolError::ExecutionError(msg)) => CallToolResult::error(msg),
            Err(e @ (ToolError::NotFound(_) | ToolError::InvalidArguments(_))) => {
                return Err(JsonRpcError::new(error_codes::INVALID_PARAMS, e.to_string()))
            }
            Err(e) => return Err(JsonRpcError::new(error_codes::INTERNAL_ERROR, e.to_string())),
        };

        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::new(error_codes::INTERNAL_ERROR, e.to_string()))
    }

    async fn read_resource(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = parse_params(params)?;

        match self.resources.read_resource(&params.uri).await {
            Ok(contents) => Ok(json!({ "contents": [contents] })),
            Err(e @ ResourceError::NotFound(_)) => Err(JsonRpcError {
                code: error_codes::RESOURCE_NOT_FOUND,
                message: e.to_string(),
                data: Some(json!({ "uri": params.uri })),
            }),
            Err(e) => Err(JsonRpcError::new(error_codes::INTERNAL_ERROR, e.to_string())),
        }
    }

    /// Serve newline-delimited JSON-RPC until `reader` reaches EOF
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_message(line.trim()).await,
                Err(e) => {
                    warn!(error = %e, "Discarding non UTF-8 message");
                    Some(JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::new(error_codes::PARSE_ERROR, format!("Parse error: {}", e)),
                    ))
                }
            };

            if let Some(response) = response {
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        debug!(server = %self.info.name, "Input closed");
        Ok(())
    }

    /// Serve on the process's stdin/stdout
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        info!(server = %self.info.name, version = %self.info.version, "Serving MCP over stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| {
        JsonRpcError::new(error_codes::INVALID_PARAMS, "Missing params")
    })?;
    serde_json::from_value(params).map_err(|e| {
        JsonRpcError::new(error_codes::INVALID_PARAMS, format!("Invalid params: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatch_protocol::models::{MCPResourceDefinition, MCPToolDefinition};
    use pretty_assertions::assert_eq;

    async fn test_server() -> McpServer {
        let server = McpServer::new("test-server").with_instructions("Be nice");
        server
            .tools()
            .register_tool(
                MCPToolDefinition::new(
                    "shout",
                    "Uppercase a word",
                    json!({
                        "type": "object",
                        "properties": { "word": { "type": "string" } },
                        "required": ["word"]
                    }),
                ),
                Box::new(|args| {
                    Box::pin(async move {
                        let word = args["word"].as_str().unwrap_or_default().to_uppercase();
                        Ok(Value::String(word))
                    })
                }),
            )
            .await
            .unwrap();
        server
            .tools()
            .register_tool(
                MCPToolDefinition::new("broken", "Always fails", json!({ "type": "object" })),
                Box::new(|_| Box::pin(async { Err(anyhow::anyhow!("backend unavailable")) })),
            )
            .await
            .unwrap();
        server
            .resources()
            .register_resource(
                MCPResourceDefinition {
                    uri: "memo://today".to_string(),
                    name: "Today".to_string(),
                    description: None,
                    mime_type: Some("text/plain".to_string()),
                },
                Box::new(|| Box::pin(async { Ok("sunny".to_string()) })),
            )
            .await
            .unwrap();
        server
    }

    async fn call(server: &McpServer, method: &str, params: Option<Value>) -> JsonRpcResponse {
        server
            .handle_request(JsonRpcRequest::new(1, method, params))
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn initialize_reports_identity_and_capabilities() {
        let server = test_server().await;
        let resp = call(&server, "initialize", Some(json!({}))).await;
        let result = resp.result.unwrap();

        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["serverInfo"]["version"], crate::VERSION);
        assert_eq!(result["instructions"], "Be nice");
        assert!(result["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = test_server().await;
        let resp = server
            .handle_request(JsonRpcRequest::notification("notifications/initialized", None))
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn tools_call_wraps_text_output() {
        let server = test_server().await;
        let resp = call(
            &server,
            "tools/call",
            Some(json!({ "name": "shout", "arguments": { "word": "hatch" } })),
        )
        .await;
        assert_eq!(
            resp.result.unwrap(),
            json!({ "content": [{ "type": "text", "text": "HATCH" }], "isError": false })
        );
    }

    #[tokio::test]
    async fn tools_call_errors() {
        let server = test_server().await;

        let unknown = call(&server, "tools/call", Some(json!({ "name": "nope" }))).await;
        assert_eq!(unknown.error.unwrap().code, error_codes::INVALID_PARAMS);

        let invalid = call(
            &server,
            "tools/call",
            Some(json!({ "name": "shout", "arguments": { "word": 3 } })),
        )
        .await;
        assert_eq!(invalid.error.unwrap().code, error_codes::INVALID_PARAMS);

        let failing = call(&server, "tools/call", Some(json!({ "name": "broken" }))).await;
        let result = failing.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("backend unavailable"));
    }

    #[tokio::test]
    async fn resources_read_and_missing() {
        let server = test_server().await;

        let resp = call(&server, "resources/read", Some(json!({ "uri": "memo://today" }))).await;
        assert_eq!(
            resp.result.unwrap(),
            json!({
                "contents": [{ "uri": "memo://today", "mimeType": "text/plain", "text": "sunny" }]
            })
        );

        let missing = call(&server, "resources/read", Some(json!({ "uri": "memo://never" }))).await;
        let error = missing.error.unwrap();
        assert_eq!(error.code, error_codes::RESOURCE_NOT_FOUND);
        assert_eq!(error.data, Some(json!({ "uri": "memo://never" })));
    }

    #[tokio::test]
    async fn unknown_method_and_bad_version() {
        let server = test_server().await;
        let resp = call(&server, "prompts/list", None).await;
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

        let mut request = JsonRpcRequest::new(2, "ping", None);
        request.jsonrpc = "1.0".to_string();
        let resp = server.handle_request(request).await.unwrap();
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn garbage_line_is_parse_error() {
        let server = test_server().await;
        let resp = server.handle_message("{not json").await.unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn serve_answers_each_request_line() {
        let server = test_server().await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#,
            "\n"
        );
        let mut output = Vec::new();
        server
            .serve(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let lines: Vec<JsonRpcResponse> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].id, json!(1));
        assert_eq!(lines[0].result, Some(json!({})));
        assert_eq!(lines[1].id, json!(2));
        assert_eq!(lines[1].result.as_ref().unwrap()["resources"][0]["uri"], "memo://today");
    }

    #[tokio::test]
    async fn serve_survives_invalid_utf8() {
        let server = test_server().await;
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        input.push(b'\n');
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let mut output = Vec::new();
        server
            .serve(BufReader::new(&input[..]), &mut output)
            .await
            .expect("session keeps running");

        let lines: Vec<JsonRpcResponse> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].id, json!(1));
        assert_eq!(lines[1].id, Value::Null);
        assert_eq!(lines[1].error.as_ref().unwrap().code, error_codes::PARSE_ERROR);
        assert_eq!(lines[2].id, json!(2));
        assert_eq!(lines[2].result, Some(json!({})));
    }

    #[tokio::test]
    async fn null_id_request_is_answered() {
        let server = test_server().await;
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .expect("null id is a request, not a notification");
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.result, Some(json!({})));
    }

    #[tokio::test]
    async fn non_request_json_is_invalid_request() {
        let server = test_server().await;

        let resp = server.handle_message(r#"{"id":5}"#).await.unwrap();
        assert_eq!(resp.id, json!(5));
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_REQUEST);

        let resp = server.handle_message("[]").await.unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn missing_params_are_invalid_params() {
        let server = test_server().await;
        for method in ["tools/call", "resources/read"] {
            let error = call(&server, method, None).await.error.unwrap();
            assert_eq!(error.code, error_codes::INVALID_PARAMS);
            assert_eq!(error.message, "Missing params");
        }
    }
}
