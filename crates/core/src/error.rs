use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unified error type for all relay operations.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("profile '{profile}' not found. Available profiles: {}", .available.join(", "))]
    ProfileNotFound {
        profile: String,
        available: Vec<String>,
    },

    #[error("profile '{profile}' is missing a usable {field}")]
    Config { profile: String, field: &'static str },

    #[error("upstream request timed out: {0}")]
    Timeout(String),

    #[error("failed to connect to upstream: {0}")]
    Network(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProfileNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Config { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Network(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::ProfileNotFound { .. } | Self::BadRequest(_) | Self::PayloadTooLarge(_) => {
                "invalid_request_error"
            }
            Self::Config { .. } => "configuration_error",
            Self::Timeout(_) | Self::Network(_) => "upstream_error",
            Self::Internal(_) => "server_error",
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Self::ProfileNotFound { .. } => "profile_not_found",
            Self::Config { .. } => "missing_credentials",
            Self::Timeout(_) => "upstream_timeout",
            Self::Network(_) => "upstream_unreachable",
            Self::BadRequest(_) => "invalid_request",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut error = json!({
            "message": self.to_string(),
            "type": self.error_type(),
            "code": self.error_code(),
        });
        match &self {
            Self::ProfileNotFound { profile, available } => {
                error["profile"] = json!(profile);
                error["available_profiles"] = json!(available);
            }
            Self::Config { profile, field } => {
                error["profile"] = json!(profile);
                error["field"] = json!(field);
            }
            _ => {}
        }

        (
            status,
            [("content-type", "application/json")],
            json!({ "error": error }).to_string(),
        )
            .into_response()
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Network(format!("connection failed: {e}"))
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<BytesRejection> for ProxyError {
    fn from(e: BytesRejection) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(e.body_text())
        } else {
            Self::BadRequest(e.body_text())
        }
    }
}
