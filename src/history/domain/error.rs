//! Error types for history action parsing.

use thiserror::Error;

/// Errors returned while constructing history domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryDomainError {
    /// The action name is not recognized.
    #[error("unknown history action: {0}")]
    UnknownAction(String),
}
