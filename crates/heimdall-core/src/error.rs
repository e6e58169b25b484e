//! Error types for `heimdall-core`.
//!
//! Each layer has its own error enum; [`AuthError`] is the taxonomy the
//! pipeline hands to callers. Its [`Display`](std::fmt::Display) output is for
//! logs only. Anything shown to a client goes through
//! [`AuthError::public_message`].

use crate::ratelimit::Scope;

/// Failures from the [`Storage`](crate::storage::Storage) capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No record with the given key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or failed mid-operation.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Convenience alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// I/O failure from a rate-limit counter backend.
#[derive(Debug, thiserror::Error)]
#[error("rate limit store unavailable: {0}")]
pub struct StoreError(pub String);

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError(e.to_string())
    }
}

/// Why a token was rejected. Never shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token signature does not verify")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// A request field failed its constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Outcome taxonomy of the authentication pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("rate limit exceeded for {scope} scope")]
    RateLimitExceeded { scope: Scope },

    #[error("invalid credentials")]
    InvalidCredentials,

    /// The user exists but belongs to a different tenant than the one requested.
    #[error("user does not belong to the requested tenant")]
    TenantMismatch,

    #[error("invalid token: {reason}")]
    InvalidToken { reason: TokenError },

    #[error("missing authorization header")]
    MissingAuthorization,

    #[error("authorization header is not a bearer token")]
    MalformedAuthorization,

    /// A role check ran without an authenticated identity.
    #[error("no authenticated claims in request context")]
    MissingClaims,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("tenant not found")]
    TenantNotFound,

    #[error("user not found")]
    UserNotFound,

    /// The rate-limit backend failed; admission is denied.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error(transparent)]
    Storage(StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Message safe to return to a client.
    ///
    /// Credential and token failures are collapsed so a caller cannot tell
    /// which check rejected them.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::RateLimitExceeded { scope } => {
                format!("Too many requests from this {scope}")
            }
            AuthError::InvalidCredentials | AuthError::TenantMismatch => {
                "Invalid credentials".to_string()
            }
            AuthError::InvalidToken { .. }
            | AuthError::UserNotFound
            | AuthError::MissingClaims => "Invalid token".to_string(),
            AuthError::MissingAuthorization => "Missing authorization header".to_string(),
            AuthError::MalformedAuthorization => {
                "Invalid authorization header format".to_string()
            }
            AuthError::Forbidden => "Insufficient permissions".to_string(),
            AuthError::TenantNotFound => "Tenant not found".to_string(),
            AuthError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
            AuthError::Validation(e) => e.to_string(),
            AuthError::Storage(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// `true` for failures that must look identical to a client.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::TenantMismatch
                | AuthError::InvalidToken { .. }
                | AuthError::UserNotFound
                | AuthError::MissingClaims
        )
    }
}

impl From<TokenError> for AuthError {
    fn from(reason: TokenError) -> Self {
        AuthError::InvalidToken { reason }
    }
}
