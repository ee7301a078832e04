//! Error types for the bot's HTTP surface and Slack client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use incident_core::{IncidentError, PlatformError};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request signature or timestamp rejected.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Malformed request body or payload.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An incident operation failed.
    #[error("{0}")]
    Incident(#[from] IncidentError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Incident(IncidentError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Incident(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "authentication_failed",
            Self::BadRequest(_) => "bad_request",
            Self::Incident(IncidentError::InvalidInput(_)) => "invalid_input",
            Self::Incident(IncidentError::LedgerNotFound(_)) => "ledger_not_found",
            Self::Incident(IncidentError::LedgerUnreadable(_)) => "ledger_unreadable",
            Self::Incident(IncidentError::ChannelNamesExhausted { .. }) => {
                "channel_names_exhausted"
            }
            Self::Incident(IncidentError::Platform { .. }) => "platform_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// A Slack Web API `ok: false` response.
#[derive(Debug, Clone)]
pub struct SlackApiError {
    /// Error code from Slack (e.g., "channel_not_found").
    pub code: String,
    /// Slack method that failed.
    pub method: String,
}

impl SlackApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            method: method.into(),
        }
    }
}

impl From<SlackApiError> for PlatformError {
    fn from(err: SlackApiError) -> Self {
        match err.code.as_str() {
            "name_taken" => PlatformError::NameTaken(err.method),
            "not_in_channel" => PlatformError::NotInChannel(err.method),
            "ratelimited" | "rate_limited" => PlatformError::RateLimited {
                retry_after_secs: 30,
            },
            "invalid_auth" | "not_authed" | "account_inactive" | "token_revoked" => {
                PlatformError::Auth(format!("{}: {}", err.method, err.code))
            }
            _ => PlatformError::Api(format!("{}: {}", err.method, err.code)),
        }
    }
}

/// Map a transport failure onto the platform error taxonomy.
pub fn network_error(err: reqwest::Error) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Timeout(err.to_string())
    } else if err.is_connect() {
        PlatformError::Network(format!("Connection failed: {}", err))
    } else if err.is_decode() {
        PlatformError::InvalidResponse(err.to_string())
    } else {
        PlatformError::Network(err.to_string())
    }
}
