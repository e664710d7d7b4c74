//! Configuration management for ostatic.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with the `OSTATIC_` prefix
//! - Defaults for every setting
//!
//! # Commands
//!
//! - `ostatic` / `ostatic serve` - run the gateway
//! - `ostatic issue` - mint a token offline with the configured secret
//!
//! # Environment Variables
//!
//! - `OSTATIC_HOST` - Server bind address (default: 0.0.0.0)
//! - `OSTATIC_PORT` - Server port (default: 8080)
//! - `OSTATIC_DIRECTORY` - Directory to serve (default: static)
//! - `OSTATIC_MOUNT_PATH` - URL prefix of the served tree (default: /<directory name>)
//! - `OSTATIC_AUTH_MODE` - `token` or `backend` (default: token)
//! - `OSTATIC_TOKEN_EXPIRE` - Token lifetime in minutes (default: 2)
//! - `OSTATIC_TOKEN_SECRET_KEY` - Token signing secret
//! - `OSTATIC_TOKEN_ALGORITHM` - HS256, HS384 or HS512 (default: HS256)
//! - `OSTATIC_TOKEN_SUBJECT` - Subject of issued tokens (default: anonymous)
//! - `OSTATIC_BACKEND_ROUTE` - Delegation endpoint (default: http://localhost:8000/auth)
//! - `OSTATIC_BACKEND_CODE` - Status meaning "authorized" (default: 200)
//! - `OSTATIC_BACKEND_TIMEOUT` - Backend timeout in seconds (default: 5)
//! - `OSTATIC_AUTH_HEADER` - Header forwarded to the backend (default: Authorization)
//! - `OSTATIC_CORS_ALLOW_ORIGIN` - Enables CORS for this origin
//! - `OSTATIC_CACHE_MAX_AGE` - Adds `Cache-Control: public, max-age=N`

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use http::{HeaderName, HeaderValue, StatusCode};
use jsonwebtoken::Algorithm;

use crate::auth::backend::{BackendConfig, DEFAULT_BACKEND_CODE, DEFAULT_BACKEND_ROUTE};
use crate::auth::issuer::DEFAULT_TOKEN_SUBJECT;
use crate::auth::token::SUPPORTED_ALGORITHMS;
use crate::error::ConfigError;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default served directory.
pub const DEFAULT_DIRECTORY: &str = "static";

/// Default token lifetime in minutes.
pub const DEFAULT_TOKEN_EXPIRE_MINUTES: u64 = 2;

/// Upper bound for the token lifetime (one year).
pub const MAX_TOKEN_EXPIRE_MINUTES: u64 = 365 * 24 * 60;

/// Example signing secret. Must be overridden in any real deployment.
pub const DEFAULT_TOKEN_SECRET: &str =
    "f3454e667c4ca52d1421832e27749b6a3257a31bbe1978142caabd1c34cfd584";

/// Default token algorithm.
pub const DEFAULT_TOKEN_ALGORITHM: &str = "HS256";

/// Default backend timeout in seconds.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 5;

/// Default header forwarded to the backend.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

// =============================================================================
// CLI Arguments
// =============================================================================

/// ostatic - serve a directory only to callers with a valid credential.
#[derive(Parser, Debug, Clone)]
#[command(name = "ostatic")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The command to run; `serve` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the gateway (default).
    Serve(ServeConfig),

    /// Mint a signed token without contacting the backend.
    Issue(IssueConfig),
}

/// How static requests are authorized.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Signed token in the `token` query parameter; enables `GET /token`
    #[default]
    Token,

    /// Caller's header forwarded to the delegation backend
    Backend,
}

// =============================================================================
// Serve Configuration
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "OSTATIC_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "OSTATIC_PORT")]
    pub port: u16,

    /// Directory to serve.
    #[arg(long, default_value = DEFAULT_DIRECTORY, env = "OSTATIC_DIRECTORY")]
    pub directory: PathBuf,

    /// URL prefix of the served tree.
    ///
    /// Defaults to `/` followed by the final component of `--directory`.
    #[arg(long, env = "OSTATIC_MOUNT_PATH")]
    pub mount_path: Option<String>,

    /// Add `Cache-Control: public, max-age=N` to file responses.
    #[arg(long, env = "OSTATIC_CACHE_MAX_AGE")]
    pub cache_max_age: Option<u32>,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// How static requests are authorized.
    #[arg(long, value_enum, default_value_t = AuthMode::Token, env = "OSTATIC_AUTH_MODE")]
    pub auth_mode: AuthMode,

    #[command(flatten)]
    pub token: TokenArgs,

    /// Do not expose `GET /token` in token mode.
    #[arg(long, default_value_t = false)]
    pub no_token_endpoint: bool,

    /// Delegation endpoint the caller's header is forwarded to.
    #[arg(long, default_value = DEFAULT_BACKEND_ROUTE, env = "OSTATIC_BACKEND_ROUTE")]
    pub backend_route: String,

    /// Status code the backend answers with for authorized callers.
    #[arg(long, default_value_t = DEFAULT_BACKEND_CODE, env = "OSTATIC_BACKEND_CODE")]
    pub backend_code: u16,

    /// Backend timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_BACKEND_TIMEOUT_SECS, env = "OSTATIC_BACKEND_TIMEOUT")]
    pub backend_timeout: u64,

    /// Header read from callers and forwarded to the backend.
    #[arg(long, default_value = DEFAULT_AUTH_HEADER, env = "OSTATIC_AUTH_HEADER")]
    pub auth_header: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allow cross-origin requests (with credentials) from this origin.
    ///
    /// If not specified, no CORS headers are sent.
    #[arg(long, env = "OSTATIC_CORS_ALLOW_ORIGIN")]
    pub cors_allow_origin: Option<String>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

/// Token signing settings shared by `serve` and `issue`.
#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    /// Token lifetime in minutes.
    #[arg(long, default_value_t = DEFAULT_TOKEN_EXPIRE_MINUTES, env = "OSTATIC_TOKEN_EXPIRE")]
    pub token_expire: u64,

    /// Token signing secret.
    #[arg(long, default_value = DEFAULT_TOKEN_SECRET, env = "OSTATIC_TOKEN_SECRET_KEY", hide_default_value = true)]
    pub token_secret: String,

    /// Token signing algorithm (HS256, HS384 or HS512).
    #[arg(long, default_value = DEFAULT_TOKEN_ALGORITHM, env = "OSTATIC_TOKEN_ALGORITHM")]
    pub token_algorithm: String,

    /// Subject of issued tokens.
    #[arg(long, default_value = DEFAULT_TOKEN_SUBJECT, env = "OSTATIC_TOKEN_SUBJECT")]
    pub token_subject: String,
}

impl TokenArgs {
    /// Validate the token settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_secret.is_empty() {
            return Err(
                "Token secret must not be empty. Set --token-secret or OSTATIC_TOKEN_SECRET_KEY"
                    .to_string(),
            );
        }
        self.algorithm()?;
        if self.token_expire == 0 {
            return Err("token_expire must be greater than 0".to_string());
        }
        if self.token_expire > MAX_TOKEN_EXPIRE_MINUTES {
            return Err(format!(
                "token_expire must be at most {} minutes",
                MAX_TOKEN_EXPIRE_MINUTES
            ));
        }
        if self.token_subject.is_empty() {
            return Err("token_subject must not be empty".to_string());
        }
        Ok(())
    }

    /// Parsed signing algorithm.
    pub fn algorithm(&self) -> Result<Algorithm, String> {
        Algorithm::from_str(&self.token_algorithm)
            .ok()
            .filter(|alg| SUPPORTED_ALGORITHMS.contains(alg))
            .ok_or_else(|| {
                format!(
                    "Unsupported token algorithm '{}' (use HS256, HS384 or HS512)",
                    self.token_algorithm
                )
            })
    }

    /// Token lifetime.
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.token_expire.saturating_mul(60))
    }

    /// Whether the example secret is still in use.
    pub fn uses_default_secret(&self) -> bool {
        self.token_secret == DEFAULT_TOKEN_SECRET
    }
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.directory.as_os_str().is_empty() {
            return Err("Directory is required. Set --directory or OSTATIC_DIRECTORY".to_string());
        }

        let mount = self.mount();
        if mount == "/" || mount.is_empty() {
            return Err(
                "Mount path must not be the site root. Set --mount-path or OSTATIC_MOUNT_PATH"
                    .to_string(),
            );
        }

        self.token.validate()?;

        self.backend_config().map_err(|e| e.to_string())?;

        if let Some(ref origin) = self.cors_allow_origin {
            if HeaderValue::from_str(origin).is_err() || origin.is_empty() {
                return Err(format!("Invalid CORS origin: '{}'", origin));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL prefix of the served tree, with a leading and no trailing slash.
    pub fn mount(&self) -> String {
        let raw = match self.mount_path {
            Some(ref path) => path.clone(),
            None => default_mount(&self.directory),
        };
        let trimmed = raw.trim_matches('/');
        format!("/{}", trimmed)
    }

    /// Whether `GET /token` is served.
    pub fn token_endpoint_enabled(&self) -> bool {
        self.auth_mode == AuthMode::Token && !self.no_token_endpoint
    }

    /// Delegation backend settings.
    pub fn backend_config(&self) -> Result<BackendConfig, ConfigError> {
        let status = StatusCode::from_u16(self.backend_code)
            .ok()
            .filter(|status| (100..=599).contains(&status.as_u16()))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "backend_code must be a valid HTTP status, got {}",
                    self.backend_code
                ))
            })?;

        let header = HeaderName::from_str(&self.auth_header).map_err(|_| {
            ConfigError::Invalid(format!("Invalid auth header name: '{}'", self.auth_header))
        })?;

        if self.backend_timeout == 0 {
            return Err(ConfigError::Invalid(
                "backend_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(BackendConfig::parse(&self.backend_route)?
            .with_expected_status(status)
            .with_header_name(header)
            .with_timeout(Duration::from_secs(self.backend_timeout)))
    }
}

fn default_mount(directory: &Path) -> String {
    directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_DIRECTORY.to_string())
}

// =============================================================================
// Issue Configuration
// =============================================================================

/// Output format for the issue command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueOutputFormat {
    /// Print only the token
    #[default]
    Token,

    /// Print the same JSON body `GET /token` returns
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct IssueConfig {
    #[command(flatten)]
    pub token: TokenArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = IssueOutputFormat::Token)]
    pub format: IssueOutputFormat,
}

impl IssueConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.token.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
