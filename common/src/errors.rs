//! Error taxonomy shared by all services.
//!
//! Every failure that can reach a client is an [`AppError`]. Each variant has
//! a stable error code and HTTP status; the response body is built by
//! [`crate::response::ErrorResponse`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use validator::ValidationErrors;

use crate::response::ErrorResponse;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad, missing or conflicting input fields.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The database id does not resolve to a usable pool.
    #[error("Cannot resolve database: {0}")]
    PoolResolution(String),

    /// No connection became available before the acquire timeout.
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    /// The SQL engine rejected or failed the statement; message kept verbatim.
    #[error("{0}")]
    Execution(String),

    /// Failure of the metadata store itself.
    #[error("Database error: {0}")]
    DatabaseQuery(String),

    /// Failure reading or writing script/macro content.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias used across services.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Validation error without field details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Validation error attributed to a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            details: Some(json!({ field: [message.clone()] })),
            message,
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Maps a metadata-store error, turning unique violations into conflicts.
    pub fn store(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => Self::PoolExhausted("metadata store".to_string()),
            _ => Self::DatabaseQuery(err.to_string()),
        }
    }

    /// Maps an error raised while running a client statement.
    pub fn execution(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => Self::Execution(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                Self::PoolExhausted("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => Self::PoolResolution("connection pool is closed".to_string()),
            other => Self::Execution(other.to_string()),
        }
    }

    /// Stable error code for client handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::PoolResolution(_) => "POOL_RESOLUTION_ERROR",
            Self::PoolExhausted(_) => "POOL_EXHAUSTED",
            Self::Execution(_) => "EXECUTION_ERROR",
            Self::DatabaseQuery(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } | Self::PoolResolution(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PoolExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Execution(_)
            | Self::DatabaseQuery(_)
            | Self::Storage(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::Validation { details, .. } => details.clone(),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Map::new();
        let mut first = None;
        for (field, errs) in errors.field_errors() {
            let messages: Vec<Value> = errs
                .iter()
                .map(|e| {
                    let text = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    if first.is_none() {
                        first = Some(format!("{field}: {text}"));
                    }
                    Value::String(text)
                })
                .collect();
            fields.insert(field.to_string(), Value::Array(messages));
        }
        Self::Validation {
            message: first.unwrap_or_else(|| "invalid input".to_string()),
            details: Some(Value::Object(fields)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorResponse::new(self.code(), self.to_string(), self.details());
        (status, Json(body)).into_response()
    }
}
