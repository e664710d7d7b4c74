//! Credential verification.
//!
//! Static requests are guarded by one of two interchangeable strategies:
//!
//! - [`token::QueryTokenVerifier`] - a locally signed token in `?token=`
//! - [`backend::BackendAuthorizer`] - the caller's header is forwarded to a
//!   backend whose status code decides
//!
//! Both implement [`CredentialVerifier`]. The decision is computed freshly for
//! every request; nothing is cached.

pub mod backend;
pub mod issuer;
pub mod token;

use async_trait::async_trait;
use http::HeaderMap;

use crate::error::AuthError;

pub use backend::{BackendAuthorizer, BackendConfig};
pub use issuer::{TokenIssuer, TokenResponse};
pub use token::{Claims, QueryTokenVerifier, TokenCodec};

/// Decides whether a request carries an acceptable credential.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify the credential found in the request headers or raw query string.
    async fn verify(&self, headers: &HeaderMap, query: Option<&str>) -> Result<(), AuthError>;

    /// Like [`verify`](Self::verify), collapsed to a yes/no answer.
    async fn is_authorized(&self, headers: &HeaderMap, query: Option<&str>) -> bool {
        self.verify(headers, query).await.is_ok()
    }
}
