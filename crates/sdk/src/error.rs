//! Error types for the sheetgate SDK.

/// Result type for SDK operations.
pub type SheetgateResult<T> = Result<T, SheetgateError>;

/// Error types that can occur when calling the gateway.
#[derive(Debug, thiserror::Error)]
pub enum SheetgateError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The gateway does not know the requested tool.
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// The arguments failed the gateway's schema validation.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Rate limited by the gateway.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// The spreadsheet backend failed; the message is already
    /// sanitized by the gateway.
    #[error("Backend failure: {0}")]
    Backend(String),

    /// Any other error response from the gateway.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl SheetgateError {
    /// Whether retrying later may help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SheetgateError::RateLimited { .. } | SheetgateError::Backend(_) | SheetgateError::Http(_)
        )
    }
}
