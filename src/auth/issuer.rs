//! Token issuance.
//!
//! A caller exchanges a credential accepted by the delegation backend for a
//! short-lived signed token, which can then be passed as `?token=` on static
//! requests.

use std::time::Duration;

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::backend::BackendAuthorizer;
use super::token::{Claims, TokenCodec};
use super::CredentialVerifier;
use crate::error::IssueError;

/// Default token lifetime (2 minutes).
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(2 * 60);

/// Default subject of issued tokens.
pub const DEFAULT_TOKEN_SUBJECT: &str = "anonymous";

/// Token type label returned alongside every token.
pub const TOKEN_TYPE: &str = "bearer";

/// Body returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: TOKEN_TYPE.to_string(),
        }
    }
}

/// Mints tokens for callers the backend vouches for.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    backend: BackendAuthorizer,
    codec: TokenCodec,
    lifetime: Duration,
    subject: String,
}

impl TokenIssuer {
    pub fn new(backend: BackendAuthorizer, codec: TokenCodec) -> Self {
        Self {
            backend,
            codec,
            lifetime: DEFAULT_TOKEN_LIFETIME,
            subject: DEFAULT_TOKEN_SUBJECT.to_string(),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Authenticate the caller against the backend, then sign a token.
    pub async fn issue(&self, headers: &HeaderMap) -> Result<TokenResponse, IssueError> {
        self.backend.verify(headers, None).await?;

        let claims = Claims::expiring_in(&self.subject, self.lifetime);
        let token = self.codec.encode(&claims)?;

        info!(sub = %self.subject, exp = claims.exp, "Issued access token");
        Ok(TokenResponse::bearer(token))
    }
}
