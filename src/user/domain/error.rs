//! Error types for user profile validation.

use thiserror::Error;

/// Errors returned while constructing user domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserDomainError {
    /// The username is empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The username length is outside the accepted range.
    #[error("username '{0}' must be between 3 and 50 characters")]
    UsernameLength(String),

    /// The username contains whitespace or control characters.
    #[error("username '{0}' must not contain whitespace")]
    InvalidUsername(String),

    /// The email address is malformed.
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    /// The credential hash is empty.
    #[error("credential hash must not be empty")]
    EmptyCredential,
}
