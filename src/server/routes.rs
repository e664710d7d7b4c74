//! Router configuration for ostatic.
//!
//! This module defines the HTTP routes and applies middleware for
//! authorization, CORS and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health              - Health check (public)
//! /token               - Token issuance (token mode, optional)
//! /{mount}/{*path}     - Served files (guarded)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ostatic::auth::{QueryTokenVerifier, TokenCodec};
//! use ostatic::files::StaticFiles;
//! use ostatic::server::routes::{create_token_router, RouterConfig};
//!
//! let codec = TokenCodec::new("my-secret-key", jsonwebtoken::Algorithm::HS256)?;
//! let config = RouterConfig::new("/static")
//!     .with_cors_allow_origin("https://example.com");
//!
//! let router = create_token_router(StaticFiles::new("static"), codec, None, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{require_credential, SharedVerifier};
use super::handlers::{health_handler, static_handler, token_handler, AppState};
use crate::auth::{BackendAuthorizer, QueryTokenVerifier, TokenCodec, TokenIssuer};
use crate::files::StaticFiles;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// URL prefix of the served tree (e.g. "/static")
    pub mount_path: String,

    /// Single origin allowed for cross-origin requests (None = no CORS)
    pub cors_allow_origin: Option<String>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration serving files under `mount_path`.
    ///
    /// By default:
    /// - CORS is disabled
    /// - Tracing is enabled
    pub fn new(mount_path: impl Into<String>) -> Self {
        Self {
            mount_path: normalize_mount(&mount_path.into()),
            cors_allow_origin: None,
            enable_tracing: true,
        }
    }

    /// Allow cross-origin requests, with credentials, from one origin.
    pub fn with_cors_allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_allow_origin = Some(origin.into());
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

fn normalize_mount(mount: &str) -> String {
    format!("/{}", mount.trim_matches('/'))
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public routes (health check)
/// - Token issuance when an issuer is given
/// - The static mount guarded by `verifier`
/// - CORS when an origin is configured
/// - Request tracing (optional)
pub fn create_router(
    files: StaticFiles,
    verifier: SharedVerifier,
    issuer: Option<TokenIssuer>,
    config: RouterConfig,
) -> Router {
    let mut app_state = AppState::new(files);
    if let Some(issuer) = issuer {
        app_state = app_state.with_issuer(issuer);
    }

    // The wildcard does not match the bare mount, so "/static" and
    // "/static/" fall through to 404 like any unknown path.
    let static_routes = Router::new()
        .route(
            &format!("{}/{{*path}}", config.mount_path),
            get(static_handler),
        )
        .route_layer(middleware::from_fn_with_state(verifier, require_credential));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .merge(static_routes);

    if app_state.issuer.is_some() {
        router = router.route("/token", get(token_handler));
    }

    let mut router = router.with_state(app_state);

    if let Some(cors) = build_cors_layer(&config) {
        router = router.layer(cors);
    }

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer, if an origin is configured.
///
/// Methods and headers mirror the preflight request, which is how "allow
/// any" is expressed when credentials are allowed.
fn build_cors_layer(config: &RouterConfig) -> Option<CorsLayer> {
    let origin = config.cors_allow_origin.as_deref()?;
    let origin = HeaderValue::from_str(origin).ok()?;

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([origin]))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
    )
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Create a router where files require a signed `?token=`.
///
/// `GET /token` is served when an issuer is given.
pub fn create_token_router(
    files: StaticFiles,
    codec: TokenCodec,
    issuer: Option<TokenIssuer>,
    config: RouterConfig,
) -> Router {
    let verifier: SharedVerifier = Arc::new(QueryTokenVerifier::new(codec));
    create_router(files, verifier, issuer, config)
}

/// Create a router where every file request is authorized by the backend.
pub fn create_backend_router(
    files: StaticFiles,
    backend: BackendAuthorizer,
    config: RouterConfig,
) -> Router {
    let verifier: SharedVerifier = Arc::new(backend);
    create_router(files, verifier, None, config)
}

// =============================================================================
// Tests
// =============================================================================
