//! Error types for role parsing.

use thiserror::Error;

/// Errors returned while constructing membership domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MembershipDomainError {
    /// The role name is not part of the seeded catalog.
    #[error("unknown role name: {0}")]
    UnknownRole(String),

    /// The role identifier is not part of the seeded catalog.
    #[error("unknown role identifier: {0}")]
    UnknownRoleId(i32),
}
