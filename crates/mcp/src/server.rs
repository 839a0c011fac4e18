// JSON-RPC loop over stdio. One request per line in, one response per
// line out; logs go to stderr so stdout stays a clean protocol channel.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolSchema,
    ToolsCapability,
};
use anyhow::Result;
use futures::StreamExt;
use serde_json::Value;
use sheetgate_core::dispatch::Dispatcher;
use sheetgate_core::types::{InvocationRequest, ToolResult};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{FramedRead, LinesCodec};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
    client_key: String,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, client_key: impl Into<String>) -> Self {
        Self {
            dispatcher,
            client_key: client_key.into(),
        }
    }

    /// Serve requests from stdin until EOF.
    pub async fn start(&self) -> Result<()> {
        let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
        let mut stdout = tokio::io::stdout();

        tracing::info!(client_key = %self.client_key, "MCP server listening on stdio");

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(_) => Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(),
                )),
            };

            if let Some(response) = response {
                let serialized = serde_json::to_string(&response)?;
                stdout.write_all(serialized.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, MCP server shutting down");
        Ok(())
    }

    /// Handle one request. Returns None for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.list_tools()),
            "tools/call" => {
                let params: CallToolParams = match request.params {
                    Some(params) => match serde_json::from_value(params) {
                        Ok(params) => params,
                        Err(e) => {
                            return Some(JsonRpcResponse::error(
                                id,
                                JsonRpcError::invalid_params(e.to_string()),
                            ))
                        }
                    },
                    None => {
                        return Some(JsonRpcResponse::error(
                            id,
                            JsonRpcError::invalid_params("missing params"),
                        ))
                    }
                };

                let arguments = match params.arguments {
                    Value::Null => serde_json::Map::new(),
                    Value::Object(map) => map,
                    _ => {
                        return Some(JsonRpcResponse::error(
                            id,
                            JsonRpcError::invalid_params("arguments must be an object"),
                        ))
                    }
                };

                let result = self
                    .dispatcher
                    .handle(InvocationRequest::new(
                        params.name,
                        arguments,
                        self.client_key.clone(),
                    ))
                    .await;

                JsonRpcResponse::success(id, render_call_result(result))
            }
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };

        Some(response)
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "sheetgate-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self
                .dispatcher
                .registry()
                .list_all()
                .iter()
                .map(|def| ToolSchema {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    input_schema: def.input_schema(),
                })
                .collect(),
        }
    }
}

/// Render a dispatcher result as MCP tool-call content. Error results
/// carry only the sanitized code and message.
fn render_call_result(result: ToolResult) -> CallToolResult {
    if result.is_success() {
        let payload = result.payload.unwrap_or(Value::Null);
        let text = serde_json::to_string(&payload).unwrap_or_else(|_| payload.to_string());
        return CallToolResult::text(text);
    }

    let code = result
        .error_code
        .and_then(|c| serde_json::to_value(c).ok())
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| "INTERNAL_ERROR".to_string());
    let message = result.error_message.unwrap_or_default();

    let mut text = format!("{}: {}", code, message);
    if let Some(retry) = result.retry_after {
        text.push_str(&format!(" (retry after {}s)", retry));
    }
    CallToolResult::error(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sheetgate_core::audit::AuditLog;
    use sheetgate_core::backend::{BackendError, SheetsBackend};
    use sheetgate_core::ratelimit::RateLimiter;
    use sheetgate_core::registry::ToolRegistry;

    struct StaticBackend(Result<Value, BackendError>);

    #[async_trait::async_trait]
    impl SheetsBackend for StaticBackend {
        async fn execute(
            &self,
            _tool: &str,
            _arguments: &serde_json::Map<String, Value>,
        ) -> Result<Value, BackendError> {
            self.0.clone()
        }
    }

    fn server(backend_result: Result<Value, BackendError>) -> McpServer {
        let dispatcher = Dispatcher::new(
            Arc::new(ToolRegistry::standard()),
            Arc::new(RateLimiter::default()),
            Arc::new(AuditLog::new()),
            Arc::new(StaticBackend(backend_result)),
        );
        McpServer::new(Arc::new(dispatcher), "stdio")
    }

    fn rpc(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::from(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server(Ok(json!({})));
        let response = server.handle_request(rpc("initialize", None)).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "sheetgate-mcp");
    }

    #[tokio::test]
    async fn test_tools_list_advertises_catalog() {
        let server = server(Ok(json!({})));
        let response = server.handle_request(rpc("tools/list", None)).await.unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 15);
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let server = server(Ok(json!({"sheets": ["Sheet1"]})));
        let response = server
            .handle_request(rpc(
                "tools/call",
                Some(json!({
                    "name": "list_sheets",
                    "arguments": {"spreadsheet_id": "1A2b3C4d5E6f7G8h9I0j-abc"},
                })),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Sheet1"));
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool_is_error_content() {
        let server = server(Ok(json!({})));
        let response = server
            .handle_request(rpc(
                "tools/call",
                Some(json!({"name": "make_coffee", "arguments": {}})),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("TOOL_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let server = server(Ok(json!({})));
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(server.handle_request(request).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server(Ok(json!({})));
        let response = server.handle_request(rpc("resources/list", None)).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }
}
