//! Application services for project membership.

mod access;
mod registry;

pub use access::{AccessError, authorize};
pub use registry::{MembershipRegistryService, MembershipServiceError, MembershipServiceResult};
