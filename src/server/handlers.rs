//! HTTP request handlers for the ostatic gateway.
//!
//! # Endpoints
//!
//! - `GET /token` - Exchange a backend-approved credential for a signed token
//! - `GET /{mount}/{path}` - Serve a file (guarded by the auth middleware)
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::auth::{TokenIssuer, TokenResponse};
use crate::error::{FileError, IssueError, TokenError};
use crate::files::{FileReply, StaticFiles};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Responder for the served directory
    pub files: Arc<StaticFiles>,

    /// Token issuer, present when `GET /token` is served
    pub issuer: Option<Arc<TokenIssuer>>,
}

impl AppState {
    /// Create application state serving `files` without a token endpoint.
    pub fn new(files: StaticFiles) -> Self {
        Self {
            files: Arc::new(files),
            issuer: None,
        }
    }

    /// Enable token issuance.
    pub fn with_issuer(mut self, issuer: TokenIssuer) -> Self {
        self.issuer = Some(Arc::new(issuer));
        self
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert FileError to HTTP response.
///
/// Traversal attempts are answered like missing files so the response does
/// not reveal what exists outside the served root.
impl IntoResponse for FileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            FileError::NotFound(_) | FileError::InvalidPath(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            FileError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                self
            );
        }

        let message = match &self {
            FileError::Io(_) => "Failed to read file".to_string(),
            _ => "Not Found".to_string(),
        };
        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

/// Convert TokenError to HTTP response.
impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        error!(
            error_type = "token_error",
            status = status.as_u16(),
            "Server error: {}",
            self
        );

        let error_response =
            ErrorResponse::with_status("token_error", "Failed to issue token", status);
        (status, Json(error_response)).into_response()
    }
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        match self {
            IssueError::Auth(err) => err.into_response(),
            IssueError::Token(err) => err.into_response(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle token requests.
///
/// # Endpoint
///
/// `GET /token`
///
/// # Headers
///
/// - `Authorization` (or the configured header): forwarded to the backend
///
/// # Response
///
/// - `200 OK`: `{"access_token": "...", "token_type": "bearer"}`
/// - `401 Unauthorized`: missing credential or backend refused it
/// - `500 Internal Server Error`: token could not be signed
pub async fn token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, Response> {
    let Some(issuer) = state.issuer.as_ref() else {
        let status = StatusCode::NOT_FOUND;
        let body = ErrorResponse::with_status("not_found", "Not Found", status);
        return Err((status, Json(body)).into_response());
    };

    issuer
        .issue(&headers)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handle static file requests.
///
/// # Endpoint
///
/// `GET /{mount}/{path}`
///
/// Authorization is enforced by the middleware in front of this handler.
///
/// # Response
///
/// - `200 OK`: file content with `ETag`, `Last-Modified` and content headers
/// - `304 Not Modified`: the client's validators match
/// - `404 Not Found`: no regular file at that path, or the path does not
///   decode to UTF-8
/// - `500 Internal Server Error`: filesystem error
pub async fn static_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Result<FileReply, FileError> {
    let Path(path) = path.map_err(|rejection| FileError::InvalidPath(rejection.body_text()))?;
    state.files.respond(&path, &headers).await
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
