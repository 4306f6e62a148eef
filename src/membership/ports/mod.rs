//! Port contracts for membership persistence.

mod repository;

pub use repository::{
    MembershipRepository, MembershipRepositoryError, MembershipRepositoryResult, RoleCatalog,
};
