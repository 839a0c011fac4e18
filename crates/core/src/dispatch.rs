// Per-request orchestration: lookup, validate, rate-limit, call the
// backend, sanitize. Every step is terminal on failure, and every call
// produces exactly one audit event and exactly one result.

use crate::audit::{AuditLog, AuditOutcome};
use crate::backend::{BackendError, SheetsBackend};
use crate::ratelimit::RateLimiter;
use crate::registry::ToolRegistry;
use crate::sanitize::sanitize;
use crate::types::{ErrorCode, InvocationRequest, ToolResult};
use crate::validate::validate;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// The gateway's request pipeline. Stateless per request; all shared
/// state lives in the injected components.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    limiter: Arc<RateLimiter>,
    audit: Arc<AuditLog>,
    backend: Arc<dyn SheetsBackend>,
    backend_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        limiter: Arc<RateLimiter>,
        audit: Arc<AuditLog>,
        backend: Arc<dyn SheetsBackend>,
    ) -> Self {
        Self {
            registry,
            limiter,
            audit,
            backend,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
        }
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Handle one invocation end to end. Never panics, never retries,
    /// and never lets raw backend detail into the returned result.
    pub async fn handle(&self, request: InvocationRequest) -> ToolResult {
        let InvocationRequest {
            tool_name,
            arguments,
            client_key,
        } = request;

        // 1. Registry lookup. Validation failures never reach the
        //    backend.
        let Some(definition) = self.registry.lookup(&tool_name) else {
            self.audit.record(
                &client_key,
                &tool_name,
                AuditOutcome::ValidationRejected,
                Some("unknown tool".to_string()),
            );
            return ToolResult::error(
                ErrorCode::ToolNotFound,
                format!("Unknown tool: {}", tool_name),
            );
        };

        // 2. Schema validation.
        if let Err(violation) = validate(definition, &arguments) {
            self.audit.record(
                &client_key,
                &tool_name,
                AuditOutcome::ValidationRejected,
                Some(violation.to_string()),
            );
            return ToolResult::error(ErrorCode::InvalidArguments, violation.to_string());
        }

        // 3. Rate limit.
        let decision = self.limiter.check(&client_key);
        if let Some(retry_after) = decision.retry_after_secs() {
            self.audit.record(
                &client_key,
                &tool_name,
                AuditOutcome::RateLimited,
                Some(format!("retry after {}s", retry_after)),
            );
            return ToolResult::rate_limited(retry_after);
        }

        // 4. Backend call, bounded. A slow backend becomes a timeout
        //    error, not a hung caller.
        let outcome = tokio::time::timeout(
            self.backend_timeout,
            self.backend.execute(&tool_name, &arguments),
        )
        .await
        .unwrap_or_else(|_| Err(BackendError::timeout(self.backend_timeout.as_secs())));

        match outcome {
            Ok(payload) => {
                self.audit
                    .record(&client_key, &tool_name, AuditOutcome::Accepted, None);
                ToolResult::success(payload)
            }
            Err(backend_err) => {
                // Raw detail goes to the audit trail only.
                self.audit.record(
                    &client_key,
                    &tool_name,
                    AuditOutcome::BackendFailed,
                    Some(backend_err.to_string()),
                );

                let sanitized = sanitize(&backend_err);
                let mut result = ToolResult::error(sanitized.code, sanitized.message);
                result.retry_after = sanitized.retry_after;
                result
            }
        }
    }
}
