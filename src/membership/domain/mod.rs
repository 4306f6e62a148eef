//! Domain model for project roles and memberships.
//!
//! Roles are a fixed seed catalog. A membership ties one user to one project
//! with one role, and the role decides which [`ProjectAction`]s the user may
//! perform.

mod actor;
mod error;
mod ids;
mod member;
mod role;

pub use actor::{Actor, ProjectAction};
pub use error::MembershipDomainError;
pub use ids::{MemberId, RoleId};
pub use member::{Member, PersistedMemberData};
pub use role::{Role, RoleName};
