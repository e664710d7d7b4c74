//! Signed access tokens.
//!
//! Tokens are compact JWTs signed with a shared HMAC secret. The claim set is
//! intentionally small:
//!
//! ```text
//! { "sub": "<subject>", "exp": <unix seconds> }
//! ```
//!
//! A token is accepted when its signature verifies under the configured
//! secret and algorithm, `exp` lies in the future (no leeway), and `sub` is
//! present. Audience, issuer and scopes are not checked.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use ostatic::auth::token::{Claims, TokenCodec};
//!
//! let codec = TokenCodec::new("my-secret-key", jsonwebtoken::Algorithm::HS256).unwrap();
//! let claims = Claims::expiring_in("alice", Duration::from_secs(120));
//! let token = codec.encode(&claims).unwrap();
//!
//! assert_eq!(codec.decode(&token).unwrap().sub.as_deref(), Some("alice"));
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use super::CredentialVerifier;
use crate::error::{AuthError, ConfigError, TokenError};

/// Query parameter carrying the access token on static requests.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Algorithms usable with a shared secret.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

// =============================================================================
// Claims
// =============================================================================

/// Claim set carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiry as Unix epoch seconds
    pub exp: u64,
}

impl Claims {
    /// Claims for `subject` that expire at the given Unix timestamp.
    pub fn new(subject: impl Into<String>, exp: u64) -> Self {
        Self {
            sub: Some(subject.into()),
            exp,
        }
    }

    /// Claims for `subject` that expire `lifetime` from now.
    pub fn expiring_in(subject: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(subject, get_current_timestamp().saturating_add(lifetime.as_secs()))
    }
}

// =============================================================================
// Token Codec
// =============================================================================

/// Encodes and verifies HMAC-signed tokens.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Create a codec for the given secret.
    ///
    /// Only HMAC algorithms are accepted since the key is a shared secret.
    pub fn new(secret: impl AsRef<[u8]>, algorithm: Algorithm) -> Result<Self, ConfigError> {
        if !SUPPORTED_ALGORITHMS.contains(&algorithm) {
            return Err(ConfigError::Invalid(format!(
                "token algorithm {:?} is not supported (use HS256, HS384 or HS512)",
                algorithm
            )));
        }

        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigError::Invalid("token secret must not be empty".to_string()));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            algorithm,
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(validation),
        })
    }

    /// The signing algorithm in use.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign a claim set.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// Fails with [`AuthError::InvalidCredential`] on any structural,
    /// cryptographic or expiry failure, and when the subject is missing.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::invalid("token has expired"),
                ErrorKind::InvalidSignature => AuthError::invalid("invalid token signature"),
                ErrorKind::InvalidAlgorithm => AuthError::invalid("unexpected token algorithm"),
                ErrorKind::InvalidToken => AuthError::invalid("malformed token"),
                _ => AuthError::invalid(format!("token validation failed: {}", e)),
            }
        })?;

        if data.claims.sub.is_none() {
            return Err(AuthError::invalid("token has no subject"));
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

// =============================================================================
// Query Token Verifier
// =============================================================================

/// Verifier that reads a signed token from the `token` query parameter.
#[derive(Debug, Clone)]
pub struct QueryTokenVerifier {
    codec: TokenCodec,
}

impl QueryTokenVerifier {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

#[async_trait]
impl CredentialVerifier for QueryTokenVerifier {
    async fn verify(&self, _headers: &HeaderMap, query: Option<&str>) -> Result<(), AuthError> {
        let token = query_token(query.unwrap_or(""))
            .ok_or_else(|| AuthError::unauthenticated(TOKEN_QUERY_PARAM))?;

        let claims = self.codec.decode(&token)?;
        debug!(sub = claims.sub.as_deref(), exp = claims.exp, "Token accepted");
        Ok(())
    }
}

/// Extract the token from a raw query string. The last occurrence wins.
fn query_token(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .last()
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
