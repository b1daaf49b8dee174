//! Shared error type across Orbit crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Missing or malformed input.
    ValidationError,
    /// Referenced record does not exist.
    NotFound,
    /// Uniqueness violated (department name, email).
    Conflict,
    /// Authentication missing or failed.
    AuthFailed,
    /// Authenticated but not allowed.
    Forbidden,
    /// Rate limited.
    RateLimited,
    /// Request body over the configured limit.
    PayloadTooLarge,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::ValidationError => "VALIDATION_ERROR",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Conflict => "CONFLICT",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::RateLimited => "RATE_LIMITED",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, OrbitError>;

/// Unified error type used by core and gateway.
///
/// Every variant is scoped to a single request; none is fatal to the process
/// and none is retried automatically.
#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    AuthFailed(String),
    #[error("{0}")]
    Forbidden(String),
    /// The rejected request was still counted against the quota.
    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl OrbitError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            OrbitError::Validation(_) => ClientCode::ValidationError,
            OrbitError::NotFound(_) => ClientCode::NotFound,
            OrbitError::Conflict(_) => ClientCode::Conflict,
            OrbitError::AuthFailed(_) => ClientCode::AuthFailed,
            OrbitError::Forbidden(_) => ClientCode::Forbidden,
            OrbitError::RateLimited { .. } => ClientCode::RateLimited,
            OrbitError::PayloadTooLarge(_) => ClientCode::PayloadTooLarge,
            OrbitError::Internal(_) => ClientCode::Internal,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        OrbitError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        OrbitError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        OrbitError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        OrbitError::Forbidden(msg.into())
    }
}
