use crate::config::{AppState, KeyPolicy};
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheetgate_core::types::{InvocationRequest, ToolResult};
use std::net::SocketAddr;
use std::sync::Arc;

/// List the tool catalog for agent integration.
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolListing>> {
    let tools = state
        .dispatcher
        .registry()
        .list_all()
        .iter()
        .map(|def| ToolListing {
            name: def.name.clone(),
            description: def.description.clone(),
            schema: def.input_schema(),
        })
        .collect();
    Json(tools)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListing {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, Value>,
}

/// Execute a tool call.
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CallToolRequest>,
) -> (StatusCode, Json<ToolResult>) {
    let client_key = derive_client_key(state.key_policy, &headers, addr);

    let result = state
        .dispatcher
        .handle(InvocationRequest::new(req.name, req.arguments, client_key))
        .await;

    let status = match result.error_code {
        None => StatusCode::OK,
        Some(code) => {
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    (status, Json(result))
}

/// Derive the rate-limit/audit key from caller identity per the
/// configured policy. Never used for authorization.
pub fn derive_client_key(policy: KeyPolicy, headers: &HeaderMap, addr: SocketAddr) -> String {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let origin = addr.ip().to_string();

    match (policy, api_key) {
        (KeyPolicy::Origin, _) => origin,
        (KeyPolicy::ApiKey, Some(key)) => key.to_string(),
        // No key presented: fall back to origin so anonymous callers
        // never pool into one shared bucket.
        (KeyPolicy::ApiKey, None) => origin,
        (KeyPolicy::Combined, Some(key)) => format!("{}@{}", key, origin),
        (KeyPolicy::Combined, None) => origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr() -> SocketAddr {
        "203.0.113.7:54321".parse().unwrap()
    }

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_api_key_policy_prefers_header() {
        let key = derive_client_key(KeyPolicy::ApiKey, &headers_with_key("agent-42"), addr());
        assert_eq!(key, "agent-42");
    }

    #[test]
    fn test_api_key_policy_falls_back_to_origin() {
        let key = derive_client_key(KeyPolicy::ApiKey, &HeaderMap::new(), addr());
        assert_eq!(key, "203.0.113.7");
    }

    #[test]
    fn test_origin_policy_ignores_header() {
        let key = derive_client_key(KeyPolicy::Origin, &headers_with_key("agent-42"), addr());
        assert_eq!(key, "203.0.113.7");
    }

    #[test]
    fn test_combined_policy() {
        let key = derive_client_key(KeyPolicy::Combined, &headers_with_key("agent-42"), addr());
        assert_eq!(key, "agent-42@203.0.113.7");
    }

    #[test]
    fn test_blank_api_key_treated_as_absent() {
        let key = derive_client_key(KeyPolicy::ApiKey, &headers_with_key("   "), addr());
        assert_eq!(key, "203.0.113.7");
    }
}
