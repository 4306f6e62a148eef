//! Repository ports for memberships and the role catalog.

use crate::membership::domain::{Member, MemberId, Role, RoleId, RoleName};
use crate::notification::domain::{Notification, NotificationId};
use crate::project::domain::ProjectId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for membership repository operations.
pub type MembershipRepositoryResult<T> = Result<T, MembershipRepositoryError>;

/// Membership persistence contract.
///
/// Role changes and removals keep at least one `ADMIN` per project: the
/// check and the write happen in the same atomic step.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Stores a new membership.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipRepositoryError::AlreadyMember`] when the user is
    /// already enrolled in the project.
    async fn store(&self, member: &Member) -> MembershipRepositoryResult<()>;

    /// Stores a new membership together with the notice sent to the member.
    /// Neither is written when the other fails.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipRepositoryError::AlreadyMember`] when the user is
    /// already enrolled in the project, or
    /// [`MembershipRepositoryError::DuplicateNotification`] when the notice
    /// identifier is taken.
    async fn enroll(&self, member: &Member, notice: &Notification)
    -> MembershipRepositoryResult<()>;

    /// Persists a role change.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipRepositoryError::NotFound`] when the membership
    /// does not exist or [`MembershipRepositoryError::LastAdmin`] when the
    /// change would demote the project's only administrator.
    async fn update(&self, member: &Member) -> MembershipRepositoryResult<()>;

    /// Finds a membership by identifier.
    async fn find_by_id(&self, id: MemberId) -> MembershipRepositoryResult<Option<Member>>;

    /// Finds the membership of `user_id` in `project_id`.
    async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipRepositoryResult<Option<Member>>;

    /// Returns the members of a project ordered by enrollment time.
    async fn list_by_project(&self, project_id: ProjectId)
    -> MembershipRepositoryResult<Vec<Member>>;

    /// Returns the memberships held by a user.
    async fn list_by_user(&self, user_id: UserId) -> MembershipRepositoryResult<Vec<Member>>;

    /// Returns memberships with the given role across every project.
    async fn list_by_role(&self, role: RoleName) -> MembershipRepositoryResult<Vec<Member>>;

    /// Returns the members of a project holding the given role.
    async fn list_by_project_and_role(
        &self,
        project_id: ProjectId,
        role: RoleName,
    ) -> MembershipRepositoryResult<Vec<Member>>;

    /// Counts the members of a project.
    async fn count_by_project(&self, project_id: ProjectId) -> MembershipRepositoryResult<u64>;

    /// Deletes a membership.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipRepositoryError::NotFound`] when the membership
    /// does not exist or [`MembershipRepositoryError::LastAdmin`] when it is
    /// the project's only administrator.
    async fn delete(&self, id: MemberId) -> MembershipRepositoryResult<()>;
}

/// Read-only access to the seeded role catalog.
#[async_trait]
pub trait RoleCatalog: Send + Sync {
    /// Returns every seeded role ordered by identifier.
    async fn list_roles(&self) -> MembershipRepositoryResult<Vec<Role>>;

    /// Finds a seeded role by name.
    async fn find_role_by_name(&self, name: RoleName) -> MembershipRepositoryResult<Option<Role>>;

    /// Finds a seeded role by identifier.
    async fn find_role_by_id(&self, id: RoleId) -> MembershipRepositoryResult<Option<Role>>;
}

/// Errors returned by membership repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MembershipRepositoryError {
    /// A membership with the same identifier already exists.
    #[error("duplicate membership identifier: {0}")]
    DuplicateMember(MemberId),

    /// The user is already enrolled in the project.
    #[error("user {user_id} is already a member of project {project_id}")]
    AlreadyMember {
        /// Project the user is enrolled in.
        project_id: ProjectId,
        /// Enrolled user.
        user_id: UserId,
    },

    /// The membership was not found.
    #[error("membership not found: {0}")]
    NotFound(MemberId),

    /// The change would leave the project without an administrator.
    #[error("project {0} must keep at least one ADMIN member")]
    LastAdmin(ProjectId),

    /// A notification with the same identifier already exists.
    #[error("duplicate notification identifier: {0}")]
    DuplicateNotification(NotificationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MembershipRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
