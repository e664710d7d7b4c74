//! # ostatic
//!
//! A gateway that serves the files of one directory only to requests bearing
//! a valid credential.
//!
//! ## Features
//!
//! - **Signed tokens**: short-lived HMAC JWTs passed as `?token=`
//! - **Delegated authorization**: forward the caller's header to a backend and
//!   trust its status code, with an explicit timeout
//! - **Token issuance**: `GET /token` exchanges a backend-approved credential
//!   for a signed token
//! - **Conditional responses**: `ETag`/`Last-Modified` validators and 304s
//!   carrying only cache headers
//! - **CORS**: optional, for a single origin with credentials
//!
//! ## Architecture
//!
//! - [`auth`] - credential verifiers, token codec and issuer
//! - [`files`] - path resolution and conditional file responses
//! - [`server`] - Axum handlers, authorization middleware and router
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use ostatic::{create_token_router, RouterConfig, StaticFiles, TokenCodec};
//!
//! #[tokio::main]
//! async fn main() {
//!     let codec = TokenCodec::new("my-secret-key", jsonwebtoken::Algorithm::HS256).unwrap();
//!     let router = create_token_router(
//!         StaticFiles::new("static"),
//!         codec,
//!         None,
//!         RouterConfig::new("/static"),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod server;

// Re-export commonly used types
pub use auth::{
    BackendAuthorizer, BackendConfig, Claims, CredentialVerifier, QueryTokenVerifier, TokenCodec,
    TokenIssuer, TokenResponse,
};
pub use config::{AuthMode, Cli, Command, IssueConfig, IssueOutputFormat, ServeConfig, TokenArgs};
pub use error::{AuthError, ConfigError, FileError, IssueError, TokenError};
pub use files::{FileReply, StaticFileEntry, StaticFiles, NOT_MODIFIED_HEADERS};
pub use server::{
    create_backend_router, create_router, create_token_router, require_credential, AppState,
    ErrorResponse, HealthResponse, RouterConfig, SharedVerifier,
};
