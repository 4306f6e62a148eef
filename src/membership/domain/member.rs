//! Project membership aggregate.

use super::{MemberId, RoleId, RoleName};
use crate::project::domain::ProjectId;
use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A user's role within one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    project_id: ProjectId,
    user_id: UserId,
    role: RoleName,
    joined_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMemberData {
    /// Persisted membership identifier.
    pub id: MemberId,
    /// Persisted project reference.
    pub project_id: ProjectId,
    /// Persisted user reference.
    pub user_id: UserId,
    /// Persisted role.
    pub role: RoleName,
    /// Persisted enrollment timestamp.
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Enrolls a user in a project.
    #[must_use]
    pub fn new(project_id: ProjectId, user_id: UserId, role: RoleName, clock: &impl Clock) -> Self {
        Self {
            id: MemberId::new(),
            project_id,
            user_id,
            role,
            joined_at: clock.utc(),
        }
    }

    /// Reconstructs a membership from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMemberData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            user_id: data.user_id,
            role: data.role,
            joined_at: data.joined_at,
        }
    }

    /// Returns the membership identifier.
    #[must_use]
    pub const fn id(&self) -> MemberId {
        self.id
    }

    /// Returns the project reference.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the user reference.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the role held in the project.
    #[must_use]
    pub const fn role(&self) -> RoleName {
        self.role
    }

    /// Returns the seeded identifier of the held role.
    #[must_use]
    pub const fn role_id(&self) -> RoleId {
        self.role.id()
    }

    /// Returns the enrollment timestamp.
    #[must_use]
    pub const fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Replaces the held role. Enrollment time is unchanged.
    pub const fn change_role(&mut self, role: RoleName) {
        self.role = role;
    }
}
