//! Domain model for registered users.
//!
//! Users are referenced by every other aggregate. Password hashing happens
//! outside the crate; the domain only carries the resulting hash.

mod error;
mod ids;
mod profile;
mod user;

pub use error::UserDomainError;
pub use ids::UserId;
pub use profile::{CredentialHash, EmailAddress, Username};
pub use user::{PersistedUserData, User, UserDependents};
