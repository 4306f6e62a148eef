//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the maximum length.
    #[error("task title must be at most 200 characters, got {0}")]
    TitleTooLong(usize),

    /// The status name is not recognized.
    #[error("unknown task status: {0}")]
    UnknownStatus(String),

    /// The priority name is not recognized.
    #[error("unknown task priority: {0}")]
    UnknownPriority(String),
}
