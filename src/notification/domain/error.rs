//! Error types for notification validation.

use thiserror::Error;

/// Errors returned while constructing notification domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationDomainError {
    /// The title is empty after trimming.
    #[error("notification title must not be empty")]
    EmptyTitle,

    /// The message is empty after trimming.
    #[error("notification message must not be empty")]
    EmptyMessage,

    /// The type tag is blank or not upper snake case.
    #[error("invalid notification type '{0}', expected UPPER_SNAKE_CASE")]
    InvalidType(String),

    /// The related entity type is not recognized.
    #[error("unknown related entity type: {0}")]
    UnknownEntityType(String),
}
