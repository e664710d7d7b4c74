//! Authorization gate for the static mount.
//!
//! Every request below the mount passes through [`require_credential`],
//! which asks the configured [`CredentialVerifier`] for a fresh decision.
//! Refusals, whatever their cause, produce the same response:
//!
//! ```text
//! HTTP/1.1 401 Unauthorized
//! content-type: application/json
//!
//! {"error":"unauthorized","message":"Unauthorized","status":401}
//! ```
//!
//! The cause is only logged.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, warn};

use super::handlers::ErrorResponse;
use crate::auth::CredentialVerifier;
use crate::error::AuthError;

/// Shared verifier used by the middleware.
pub type SharedVerifier = Arc<dyn CredentialVerifier>;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;

        // Rejected credentials could indicate probing, so log at warn level.
        // An unreachable backend is an operator problem.
        match &self {
            AuthError::Unauthenticated { .. } => {
                debug!(status = status.as_u16(), "Authorization failed: {}", self);
            }
            AuthError::InvalidCredential { .. } => {
                warn!(status = status.as_u16(), "Authorization failed: {}", self);
            }
            AuthError::BackendUnavailable { .. } => {
                error!(status = status.as_u16(), "Authorization failed: {}", self);
            }
        }

        let error_response = ErrorResponse::with_status("unauthorized", "Unauthorized", status);
        (status, Json(error_response)).into_response()
    }
}

/// Axum middleware rejecting requests the verifier does not accept.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware, routing::get};
/// use ostatic::server::auth::require_credential;
///
/// let app = Router::new()
///     .route("/static/{*path}", get(static_handler))
///     .route_layer(middleware::from_fn_with_state(verifier, require_credential));
/// ```
pub async fn require_credential(
    State(verifier): State<SharedVerifier>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (parts, body) = request.into_parts();
    verifier
        .verify(&parts.headers, parts.uri.query())
        .await?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

// =============================================================================
// Tests
// =============================================================================
