//! Proxy error taxonomy and JSON error responses.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use serde_json::json;

/// Errors surfaced to the client by the proxy.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection to upstream failed: {source}")]
    ConnectionError {
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream request timed out after {duration}s")]
    RequestTimeout { duration: u64 },

    #[error("Internal proxy error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::ConnectionError { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::RequestTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ProxyError::InvalidRequest(_) => "invalid_request",
            ProxyError::ConnectionError { .. } => "connection_error",
            ProxyError::RequestTimeout { .. } => "request_timeout",
            ProxyError::Internal(_) => "internal_error",
        }
    }
}

impl From<axum::http::Error> for ProxyError {
    fn from(err: axum::http::Error) -> Self {
        ProxyError::Internal(format!("Failed to build response: {}", err))
    }
}

/// JSON error response builder.
pub struct ErrorResponse;

impl ErrorResponse {
    pub fn from_error(error: &ProxyError, request_id: &str) -> Response {
        let body = json!({
            "error": {
                "type": error.error_type(),
                "message": error.to_string(),
                "request_id": request_id,
            }
        });

        Response::builder()
            .status(error.status_code())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| {
                Response::new(Body::from("{\"error\":{\"type\":\"internal_error\"}}"))
            })
    }
}
