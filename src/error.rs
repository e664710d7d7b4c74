use thiserror::Error;

/// Reasons a request is refused by a credential verifier.
///
/// Every variant maps to the same `401 Unauthorized` response; the variant
/// only decides how loudly the refusal is logged.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No credential material was sent (missing header or query parameter)
    #[error("Missing credential: {credential}")]
    Unauthenticated { credential: String },

    /// Credential was present but rejected (bad signature, expired, backend said no)
    #[error("Invalid credential: {reason}")]
    InvalidCredential { reason: String },

    /// The delegation backend could not be reached or timed out
    #[error("Authorization backend unavailable: {reason}")]
    BackendUnavailable { reason: String },
}

impl AuthError {
    pub fn unauthenticated(credential: impl Into<String>) -> Self {
        AuthError::Unauthenticated {
            credential: credential.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        AuthError::InvalidCredential {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        AuthError::BackendUnavailable {
            reason: reason.into(),
        }
    }
}

/// Errors raised while resolving or opening a served file
#[derive(Debug, Clone, Error)]
pub enum FileError {
    /// No regular file exists at the requested path
    #[error("File not found: {0}")]
    NotFound(String),

    /// Request path escapes the served root or contains forbidden segments
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Any other filesystem failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl FileError {
    pub(crate) fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(path.to_string()),
            _ => FileError::Io(format!("{}: {}", path, err)),
        }
    }
}

/// Errors raised while signing a token
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encode(String),
}

/// Errors from the token issuance endpoint.
#[derive(Debug, Clone, Error)]
pub enum IssueError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Errors raised while building gateway components from configuration
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
