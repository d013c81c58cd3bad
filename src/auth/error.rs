// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use tracing::{error, warn};

use crate::error::{ApiError, RepositoryError};

/// Authentication and authorization error types
#[derive(Debug)]
pub enum AuthError {
    // Authentication errors
    /// Unknown email or wrong password; the two are never distinguished
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,
    MissingToken,
    /// Token was valid but its subject no longer exists
    UnknownSubject,
    EmailAlreadyExists,
    InvalidOrExpiredResetToken,
    IncorrectPassword,
    UserNotFound,
    DatabaseError(String),
    PasswordHashError,
    InvalidPasswordFormat(String),
    TokenGenerationError(String),

    // Authorization errors
    InactiveUser,
    AdminRequired,
    /// Caller is neither the resource owner nor an admin
    AccessDenied,
    /// Non-admin attempted to change privileged fields
    RestrictedFields,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::UnknownSubject => write!(f, "Token subject does not exist"),
            AuthError::EmailAlreadyExists => write!(f, "Email already exists"),
            AuthError::InvalidOrExpiredResetToken => write!(f, "Invalid or expired reset token"),
            AuthError::IncorrectPassword => write!(f, "Incorrect old password"),
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AuthError::PasswordHashError => write!(f, "Password hashing error"),
            AuthError::InvalidPasswordFormat(msg) => write!(f, "Invalid password: {}", msg),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::InactiveUser => write!(f, "Inactive user"),
            AuthError::AdminRequired => write!(f, "Admin access required"),
            AuthError::AccessDenied => write!(f, "Access denied"),
            AuthError::RestrictedFields => write!(f, "You can only update your name and email"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::Auth(self).into_response()
    }
}

impl AuthError {
    pub(crate) fn log(&self) {
        match self {
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::MissingToken | AuthError::UnknownSubject => {
                warn!("Rejected bearer credentials: {}", self)
            }
            AuthError::InactiveUser
            | AuthError::AdminRequired
            | AuthError::AccessDenied
            | AuthError::RestrictedFields => warn!("Authorization failed: {}", self),
            AuthError::DatabaseError(msg) => error!("Database error in auth: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            _ => {}
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::UnknownSubject => StatusCode::UNAUTHORIZED,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::InvalidOrExpiredResetToken => StatusCode::BAD_REQUEST,
            AuthError::IncorrectPassword => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::PasswordHashError => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidPasswordFormat(_) => StatusCode::BAD_REQUEST,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InactiveUser => StatusCode::FORBIDDEN,
            AuthError::AdminRequired => StatusCode::FORBIDDEN,
            AuthError::AccessDenied => StatusCode::FORBIDDEN,
            AuthError::RestrictedFields => StatusCode::FORBIDDEN,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            // Every bearer failure shares one message
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::MissingToken | AuthError::UnknownSubject => {
                "Could not validate credentials".to_string()
            }
            AuthError::DatabaseError(_) | AuthError::PasswordHashError | AuthError::TokenGenerationError(_) => {
                "Internal server error".to_string()
            }
            AuthError::InvalidPasswordFormat(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<RepositoryError> for AuthError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Duplicate("email") => AuthError::EmailAlreadyExists,
            other => AuthError::DatabaseError(other.to_string()),
        }
    }
}
