//! API error envelope.
//!
//! Successful responses carry the resource shape directly; failures are
//! rendered in this uniform format so clients can branch on `error.code`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ApiError,

    /// Response metadata.
    pub meta: ResponseMeta,
}

/// API error details.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Error code for client handling (e.g., "VALIDATION_ERROR", "NOT_FOUND").
    pub code: String,

    /// Human-readable error message.
    pub message: String,

    /// Field-level details, keyed by field path (validation errors only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Response metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    /// Response timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }
}

impl ErrorResponse {
    /// Creates an error response.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            error: ApiError {
                code: code.into(),
                message: message.into(),
                details,
            },
            meta: ResponseMeta::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_omitted_when_absent() {
        let body = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "script not found: 3", None))
            .unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"].get("details").is_none());
        assert!(body["meta"]["timestamp"].is_string());
    }
}
