use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single tool invocation as seen by the dispatcher.
///
/// `client_key` identifies the caller for rate limiting and audit
/// correlation only. It carries no authorization weight: the backend's
/// own credential governs what the backend will actually do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub arguments: serde_json::Map<String, Value>,
    pub client_key: String,
}

impl InvocationRequest {
    pub fn new(
        tool_name: impl Into<String>,
        arguments: serde_json::Map<String, Value>,
        client_key: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            client_key: client_key.into(),
        }
    }
}

/// Invocation outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

/// External error taxonomy. This is the complete set of codes a client
/// can observe; backend failure detail never widens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ToolNotFound,
    InvalidArguments,
    RateLimited,
    BackendError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status class for each code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ToolNotFound => 404,
            ErrorCode::InvalidArguments => 400,
            ErrorCode::RateLimited => 429,
            ErrorCode::BackendError => 502,
            ErrorCode::InternalError => 500,
        }
    }
}

/// The single result produced for an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Seconds until the caller may retry; only set for RATE_LIMITED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ToolResult {
    pub fn success(payload: Value) -> Self {
        Self {
            status: ResultStatus::Success,
            payload: Some(payload),
            error_code: None,
            error_message: None,
            retry_after: None,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            payload: None,
            error_code: Some(code),
            error_message: Some(message.into()),
            retry_after: None,
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after: Some(retry_after_secs),
            ..Self::error(
                ErrorCode::RateLimited,
                "Too many requests. Please slow down.",
            )
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::ToolNotFound.http_status(), 404);
        assert_eq!(ErrorCode::InvalidArguments.http_status(), 400);
        assert_eq!(ErrorCode::RateLimited.http_status(), 429);
        assert_eq!(ErrorCode::BackendError.http_status(), 502);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = ToolResult::error(ErrorCode::ToolNotFound, "Unknown tool: frobnicate");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["errorCode"], "TOOL_NOT_FOUND");
        assert!(json.get("payload").is_none());
        assert!(json.get("retryAfter").is_none());
    }

    #[test]
    fn test_rate_limited_carries_retry_hint() {
        let result = ToolResult::rate_limited(42);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["errorCode"], "RATE_LIMITED");
        assert_eq!(json["retryAfter"], 42);
    }
}
