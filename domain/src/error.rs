//! Error types for the Storefront domain.

use crate::UserId;
use thiserror::Error;

/// All possible errors from domain validation and the service ports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("invalid role: {0}")]
    InvalidRole(String),

    // Auth service outcomes
    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("user account is inactive")]
    InactiveUser,
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::MissingRequiredField("first_name".into());
        assert_eq!(err.to_string(), "missing required field: first_name");

        let err = Error::PasswordTooShort { min: 6 };
        assert_eq!(
            err.to_string(),
            "password must be at least 6 characters long"
        );

        let err = Error::UserNotFound(42);
        assert_eq!(err.to_string(), "user not found: 42");
    }
}
