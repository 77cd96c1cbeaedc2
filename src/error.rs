use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unified error type for the schedulo-auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // ── Session Errors ──────────────────────────────────────────────────
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Reauthenticate(String),

    #[error("Insufficient permissions: {0}")]
    Forbidden(String),

    // ── Request Errors ──────────────────────────────────────────────────
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid state parameter")]
    InvalidState,

    // ── Provider Errors ─────────────────────────────────────────────────
    #[error("Provider {0} not found")]
    ProviderNotFound(String),

    #[error("OAuth flow error: {0}")]
    FlowError(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    // ── Internal ────────────────────────────────────────────────────────
    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::Reauthenticate(_) => (StatusCode::UNAUTHORIZED, "reauthenticate"),
            AuthError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AuthError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AuthError::InvalidState => (StatusCode::BAD_REQUEST, "invalid_state"),
            AuthError::ProviderNotFound(_) => (StatusCode::NOT_FOUND, "provider_not_found"),
            AuthError::FlowError(_) => (StatusCode::BAD_GATEWAY, "flow_error"),
            AuthError::RefreshFailed(_) => (StatusCode::BAD_GATEWAY, "refresh_failed"),
            AuthError::CryptoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "crypto_error"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
