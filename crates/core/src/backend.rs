// Backend collaborator: the service that actually performs spreadsheet
// operations. The gateway only knows `execute(tool, arguments)`.

use serde_json::{Map, Value};
use url::Url;

/// Coarse category of a backend failure. Drives sanitization; the
/// category is the only thing a client ever learns about the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Auth,
    Permission,
    Quota,
    NotFound,
    InvalidRequest,
    Network,
    Timeout,
    Other,
}

/// A backend failure: category plus raw detail. The detail is for the
/// audit trail only and must never reach a client response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("backend error ({kind:?}): {detail}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub detail: String,
    /// Set only when the backend explicitly marked a message as safe
    /// to surface verbatim.
    pub safe_message: Option<String>,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            safe_message: None,
        }
    }

    pub fn with_safe_message(mut self, message: impl Into<String>) -> Self {
        self.safe_message = Some(message.into());
        self
    }

    pub fn timeout(secs: u64) -> Self {
        Self::new(
            BackendErrorKind::Timeout,
            format!("backend call exceeded {}s timeout", secs),
        )
    }

    /// Classify an opaque error string by keyword. Mirrors how Google
    /// API error text reads in practice.
    pub fn classify(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let lower = detail.to_lowercase();

        let kind = if lower.contains("quota") || lower.contains("rate limit") || lower.contains("limit exceeded") {
            BackendErrorKind::Quota
        } else if lower.contains("permission") || lower.contains("forbidden") {
            BackendErrorKind::Permission
        } else if lower.contains("unauthorized") || lower.contains("unauthenticated") || lower.contains("invalid_grant") {
            BackendErrorKind::Auth
        } else if lower.contains("not found") {
            BackendErrorKind::NotFound
        } else if lower.contains("invalid") {
            BackendErrorKind::InvalidRequest
        } else if lower.contains("timed out") || lower.contains("timeout") {
            BackendErrorKind::Timeout
        } else if lower.contains("connection") || lower.contains("dns") || lower.contains("network") {
            BackendErrorKind::Network
        } else {
            BackendErrorKind::Other
        };

        Self::new(kind, detail)
    }
}

/// The single interface the dispatcher consumes.
#[async_trait::async_trait]
pub trait SheetsBackend: Send + Sync {
    async fn execute(
        &self,
        tool: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, BackendError>;
}

/// HTTP backend client: forwards invocations to the spreadsheet
/// service as `POST <base>/execute {"tool", "arguments"}`.
pub struct RemoteBackend {
    client: reqwest::Client,
    endpoint: Url,
    credential: Option<String>,
}

impl RemoteBackend {
    pub fn new(base_url: &str, credential: Option<String>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let base = Url::parse(base_url).context("invalid backend base URL")?;
        let endpoint = base
            .join("execute")
            .context("cannot derive backend execute endpoint")?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("sheetgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build backend HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            credential,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl SheetsBackend for RemoteBackend {
    async fn execute(
        &self,
        tool: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, BackendError> {
        let body = serde_json::json!({
            "tool": tool,
            "arguments": arguments,
        });

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(credential) = &self.credential {
            request = request.bearer_auth(credential);
        }

        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() {
                BackendErrorKind::Timeout
            } else {
                BackendErrorKind::Network
            };
            BackendError::new(kind, e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let kind = match status.as_u16() {
                401 => BackendErrorKind::Auth,
                403 => BackendErrorKind::Permission,
                404 => BackendErrorKind::NotFound,
                400 => BackendErrorKind::InvalidRequest,
                429 => BackendErrorKind::Quota,
                _ => BackendError::classify(text.as_str()).kind,
            };
            return Err(BackendError::new(
                kind,
                format!("backend returned {}: {}", status, text),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::new(BackendErrorKind::Other, format!("bad backend payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quota() {
        let err = BackendError::classify("Quota exceeded for quota metric 'Read requests'");
        assert_eq!(err.kind, BackendErrorKind::Quota);
    }

    #[test]
    fn test_classify_permission() {
        let err = BackendError::classify("HttpError 403: The caller does not have permission");
        assert_eq!(err.kind, BackendErrorKind::Permission);
    }

    #[test]
    fn test_classify_not_found_and_invalid() {
        assert_eq!(
            BackendError::classify("Requested entity was not found.").kind,
            BackendErrorKind::NotFound
        );
        assert_eq!(
            BackendError::classify("Invalid requests[0].addSheet").kind,
            BackendErrorKind::InvalidRequest
        );
    }

    #[test]
    fn test_classify_unknown_falls_back_to_other() {
        let err = BackendError::classify("something exploded in an unforeseen way");
        assert_eq!(err.kind, BackendErrorKind::Other);
    }

    #[test]
    fn test_remote_backend_endpoint() {
        let backend = RemoteBackend::new("http://localhost:9100/", None).unwrap();
        assert_eq!(backend.endpoint().as_str(), "http://localhost:9100/execute");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(RemoteBackend::new("not a url", None).is_err());
    }
}
