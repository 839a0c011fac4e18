//! Main client for the sheetgate SDK.

use crate::error::{SheetgateError, SheetgateResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheetgate_core::types::{ErrorCode, ResultStatus, ToolResult};
use std::time::Duration;
use url::Url;

/// Client for the sheetgate HTTP API.
#[derive(Clone)]
pub struct SheetgateClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

/// Builder for [`SheetgateClient`].
#[derive(Default)]
pub struct SheetgateClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl SheetgateClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway base URL, e.g. `http://localhost:8080`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// API key sent as `X-Api-Key`; used by the gateway for rate
    /// limiting and audit correlation.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> SheetgateResult<SheetgateClient> {
        let mut base = self
            .base_url
            .ok_or_else(|| SheetgateError::Config("base_url is required".to_string()))?;
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("sheetgate-sdk/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)))
            .build()?;

        Ok(SheetgateClient {
            http,
            base_url,
            api_key: self.api_key,
        })
    }
}

/// `/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// One entry of the `/tools` catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListing {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

#[derive(Serialize)]
struct CallToolBody<'a> {
    name: &'a str,
    arguments: Value,
}

impl SheetgateClient {
    pub fn builder() -> SheetgateClientBuilder {
        SheetgateClientBuilder::new()
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    /// Gateway liveness probe.
    pub async fn health(&self) -> SheetgateResult<HealthStatus> {
        let url = self.base_url.join("health")?;
        let response = self.request(self.http.get(url)).send().await?;
        Ok(response.error_for_status()?.json().await?)
    }

    /// List the tool catalog.
    pub async fn list_tools(&self) -> SheetgateResult<Vec<ToolListing>> {
        let url = self.base_url.join("tools")?;
        let response = self.request(self.http.get(url)).send().await?;
        Ok(response.error_for_status()?.json().await?)
    }

    /// Invoke a tool by name. Returns the backend payload on success;
    /// gateway rejections become typed errors.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> SheetgateResult<Value> {
        let url = self.base_url.join("tools/call")?;
        let body = CallToolBody { name, arguments };
        tracing::debug!(tool = name, "calling gateway tool");

        let response = self.request(self.http.post(url).json(&body)).send().await?;
        let http_status = response.status().as_u16();

        // Both success and error responses carry the gateway's result
        // shape; non-JSON bodies mean something other than the gateway
        // answered.
        let result: ToolResult = response
            .json()
            .await
            .map_err(|_| SheetgateError::Api {
                status: http_status,
                message: "gateway returned a malformed response".to_string(),
            })?;

        if result.status == ResultStatus::Success {
            return Ok(result.payload.unwrap_or(Value::Null));
        }

        let message = result.error_message.unwrap_or_default();
        Err(match result.error_code {
            Some(ErrorCode::ToolNotFound) => SheetgateError::ToolNotFound(name.to_string()),
            Some(ErrorCode::InvalidArguments) => SheetgateError::InvalidArguments(message),
            Some(ErrorCode::RateLimited) => SheetgateError::RateLimited {
                retry_after: result.retry_after,
            },
            Some(ErrorCode::BackendError) => SheetgateError::Backend(message),
            Some(ErrorCode::InternalError) | None => SheetgateError::Api {
                status: http_status,
                message,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> SheetgateClient {
        SheetgateClient::builder()
            .base_url(server.uri())
            .api_key("agent-42")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok", "service": "sheetgate", "version": "0.1.0",
            })))
            .mount(&server)
            .await;

        let health = client_for(&server).await.health().await.unwrap();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_call_tool_success_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .and(header("x-api-key", "agent-42"))
            .and(body_partial_json(json!({"name": "list_spreadsheets"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "payload": {"spreadsheets": []},
            })))
            .mount(&server)
            .await;

        let payload = client_for(&server)
            .await
            .call_tool("list_spreadsheets", json!({}))
            .await
            .unwrap();
        assert_eq!(payload, json!({"spreadsheets": []}));
    }

    #[tokio::test]
    async fn test_call_tool_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "status": "error",
                "errorCode": "RATE_LIMITED",
                "errorMessage": "Too many requests. Please slow down.",
                "retryAfter": 17,
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .call_tool("list_spreadsheets", json!({}))
            .await
            .unwrap_err();
        match err {
            SheetgateError::RateLimited { retry_after } => assert_eq!(retry_after, Some(17)),
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_call_tool_invalid_arguments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": "error",
                "errorCode": "INVALID_ARGUMENTS",
                "errorMessage": "invalid argument 'sheet': required argument missing",
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .call_tool("get_sheet_data", json!({"spreadsheet_id": "x"}))
            .await
            .unwrap_err();
        match err {
            SheetgateError::InvalidArguments(message) => assert!(message.contains("sheet")),
            other => panic!("expected InvalidArguments, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_requires_base_url() {
        assert!(matches!(
            SheetgateClient::builder().build(),
            Err(SheetgateError::Config(_))
        ));
    }
}
