use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use heimdall_core::{AuthError, StorageError, ValidationError};
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Auth(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(String),
    Unavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::BadRequest(msg)
            | AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::TooManyRequests(msg)
            | AppError::Unavailable(msg) => msg,
        };

        let body = ErrorBody {
            success: false,
            error: message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        let message = e.public_message();
        if e.is_authentication_failure() {
            tracing::debug!("Authentication failed: {e}");
        }
        match e {
            AuthError::RateLimitExceeded { .. } => AppError::TooManyRequests(message),
            AuthError::InvalidCredentials
            | AuthError::TenantMismatch
            | AuthError::InvalidToken { .. }
            | AuthError::MissingAuthorization
            | AuthError::MalformedAuthorization
            | AuthError::MissingClaims
            | AuthError::UserNotFound => AppError::Auth(message),
            AuthError::Forbidden => AppError::Forbidden(message),
            AuthError::TenantNotFound => AppError::NotFound(message),
            AuthError::Validation(_) => AppError::BadRequest(message),
            AuthError::StoreUnavailable(e) => {
                tracing::error!("Rate limit store unavailable: {e}");
                AppError::Unavailable(message)
            }
            AuthError::Storage(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            StorageError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}
