//! Delegated authorization.
//!
//! The gateway forwards the caller's credential header to a backend service
//! and trusts the status code it answers with:
//!
//! ```text
//! client ── GET /static/a.png ──▶ gateway ── GET {backend_route} ──▶ backend
//!           Authorization: X             Authorization: X
//!                                        ◀── 200 => authorized
//!                                        ◀── other => rejected
//! ```
//!
//! Every call is bounded by an explicit timeout. A backend that cannot be
//! reached is reported as [`AuthError::BackendUnavailable`], which fails
//! closed exactly like a rejection.

use std::time::Duration;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName, StatusCode};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::CredentialVerifier;
use crate::error::{AuthError, ConfigError};

/// Default delegation endpoint.
pub const DEFAULT_BACKEND_ROUTE: &str = "http://localhost:8000/auth";

/// Default status code meaning "authorized".
pub const DEFAULT_BACKEND_CODE: u16 = 200;

/// Default timeout for a single backend call.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Backend Configuration
// =============================================================================

/// Settings for [`BackendAuthorizer`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// URL the credential is forwarded to
    pub route: Url,

    /// Status code the backend answers with for authorized callers
    pub expected_status: StatusCode,

    /// Header read from the caller and forwarded under the same name
    pub header_name: HeaderName,

    /// Upper bound for connecting to and hearing back from the backend
    pub timeout: Duration,
}

impl BackendConfig {
    /// Configuration with default status, header and timeout.
    pub fn new(route: Url) -> Self {
        Self {
            route,
            expected_status: StatusCode::OK,
            header_name: AUTHORIZATION,
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    /// Parse the route from a string.
    pub fn parse(route: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(route)
            .map_err(|e| ConfigError::Invalid(format!("backend route '{}': {}", route, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "backend route '{}' must use http or https",
                route
            )));
        }
        Ok(Self::new(url))
    }

    pub fn with_expected_status(mut self, status: StatusCode) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_header_name(mut self, name: HeaderName) -> Self {
        self.header_name = name;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Backend Authorizer
// =============================================================================

/// Verifier that delegates the decision to a remote backend.
///
/// The underlying HTTP client is shared between requests; cloning the
/// authorizer is cheap.
#[derive(Debug, Clone)]
pub struct BackendAuthorizer {
    client: Client,
    config: BackendConfig,
}

impl BackendAuthorizer {
    /// Build an authorizer and its HTTP client.
    pub fn new(config: BackendConfig) -> Result<Self, ConfigError> {
        if config.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "backend timeout must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Name of the header forwarded to the backend.
    pub fn header_name(&self) -> &HeaderName {
        &self.config.header_name
    }
}

#[async_trait]
impl CredentialVerifier for BackendAuthorizer {
    async fn verify(&self, headers: &HeaderMap, _query: Option<&str>) -> Result<(), AuthError> {
        let name = &self.config.header_name;
        let value = headers
            .get(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AuthError::unauthenticated(name.as_str()))?;

        let response = self
            .client
            .get(self.config.route.clone())
            .header(name.clone(), value.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::unavailable(format!(
                        "no answer from {} within {:?}",
                        self.config.route, self.config.timeout
                    ))
                } else {
                    AuthError::unavailable(format!("{}: {}", self.config.route, e))
                }
            })?;

        let status = response.status();
        debug!(
            backend = %self.config.route,
            status = status.as_u16(),
            expected = self.config.expected_status.as_u16(),
            "Backend answered"
        );

        if status == self.config.expected_status {
            Ok(())
        } else {
            Err(AuthError::invalid(format!(
                "backend answered {} (expected {})",
                status.as_u16(),
                self.config.expected_status.as_u16()
            )))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
