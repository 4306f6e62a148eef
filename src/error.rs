//! Error classification shared by every service.
//!
//! Each module keeps its own typed error enums. An API layer that needs a
//! uniform status mapping reads the [`ErrorKind`] exposed by every service
//! error through its `kind()` method.

use std::fmt;

/// Transport-neutral category of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced entity identifier did not resolve.
    NotFound,
    /// An entity with the same unique key already exists.
    AlreadyExists,
    /// The user is already enrolled in the project.
    AlreadyMember,
    /// The operation targets a membership that does not exist.
    NotAMember,
    /// Input failed validation.
    ValidationFailed,
    /// The acting user lacks the project role required for the operation.
    Forbidden,
    /// The operation conflicts with dependent records.
    Conflict,
    /// The backing store failed.
    Storage,
}

impl ErrorKind {
    /// Returns the canonical upper snake case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::NotAMember => "NOT_A_MEMBER",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::Storage => "STORAGE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
