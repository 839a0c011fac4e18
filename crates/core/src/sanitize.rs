// Error sanitization: internal failures leave this module as one of a
// small set of generic, human-readable messages. Stack traces, raw API
// error text, and credential material stop here.

use crate::backend::{BackendError, BackendErrorKind};
use crate::types::ErrorCode;
use serde::{Deserialize, Serialize};

/// The client-visible rendering of an internal failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizedError {
    pub code: ErrorCode,
    pub message: String,
    /// Retry hint in seconds, set for quota-style failures.
    pub retry_after: Option<u64>,
}

/// Map a backend failure to its external rendering. The raw detail is
/// intentionally dropped; callers keep it in the audit trail instead.
pub fn sanitize(err: &BackendError) -> SanitizedError {
    // A message the backend explicitly marked safe may pass through.
    if let Some(safe) = &err.safe_message {
        return SanitizedError {
            code: ErrorCode::BackendError,
            message: safe.clone(),
            retry_after: retry_hint(err.kind),
        };
    }

    let message = match err.kind {
        BackendErrorKind::Quota => "API quota exceeded. Please try again later.",
        BackendErrorKind::Permission => "Insufficient permissions for this operation.",
        BackendErrorKind::Auth => "The backend could not authenticate with the spreadsheet service.",
        BackendErrorKind::NotFound => "The requested resource was not found.",
        BackendErrorKind::InvalidRequest => "The backend rejected the request parameters.",
        BackendErrorKind::Timeout => "The operation timed out.",
        BackendErrorKind::Network => "The spreadsheet backend is currently unavailable.",
        BackendErrorKind::Other => "An unexpected error occurred.",
    };

    SanitizedError {
        code: ErrorCode::BackendError,
        message: message.to_string(),
        retry_after: retry_hint(err.kind),
    }
}

fn retry_hint(kind: BackendErrorKind) -> Option<u64> {
    match kind {
        BackendErrorKind::Quota => Some(60),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_never_leaks() {
        let err = BackendError::new(
            BackendErrorKind::Permission,
            "HttpError 403 for sheet 1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms: \
             service account sheets-bot@project.iam.gserviceaccount.com lacks access",
        );

        let sanitized = sanitize(&err);
        assert_eq!(sanitized.code, ErrorCode::BackendError);
        assert!(!sanitized.message.contains("gserviceaccount"));
        assert!(!sanitized.message.contains("1BxiMVs0XRA5nFMdK"));
        assert_eq!(sanitized.message, "Insufficient permissions for this operation.");
    }

    #[test]
    fn test_quota_gets_retry_hint() {
        let err = BackendError::new(BackendErrorKind::Quota, "quota exceeded");
        let sanitized = sanitize(&err);
        assert_eq!(sanitized.retry_after, Some(60));
    }

    #[test]
    fn test_safe_message_passes_through() {
        let err = BackendError::new(BackendErrorKind::InvalidRequest, "raw internal detail")
            .with_safe_message("Sheet 'Budget' already exists.");
        let sanitized = sanitize(&err);
        assert_eq!(sanitized.message, "Sheet 'Budget' already exists.");
        assert!(!sanitized.message.contains("raw internal"));
    }

    #[test]
    fn test_unknown_kind_generic_message() {
        let err = BackendError::new(BackendErrorKind::Other, "panic at the disco");
        let sanitized = sanitize(&err);
        assert_eq!(sanitized.message, "An unexpected error occurred.");
        assert_eq!(sanitized.retry_after, None);
    }
}
