//! HTTP server layer for ostatic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │          GET /token          GET /{mount}/{*path}               │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌───────────────────┐   │
//! │  │  handlers   │  │       auth       │  │      routes       │   │
//! │  │ (requests)  │  │ (401 gate)       │  │ (router, CORS)    │   │
//! │  └─────────────┘  └──────────────────┘  └───────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{require_credential, SharedVerifier};
pub use handlers::{
    health_handler, static_handler, token_handler, AppState, ErrorResponse, HealthResponse,
};
pub use routes::{create_backend_router, create_router, create_token_router, RouterConfig};
