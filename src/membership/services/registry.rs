//! Service layer for enrolling users in projects and changing their roles.

use super::access::{AccessError, authorize};
use crate::error::ErrorKind;
use crate::membership::{
    domain::{
        Actor, Member, MemberId, MembershipDomainError, ProjectAction, Role, RoleId, RoleName,
    },
    ports::{MembershipRepository, MembershipRepositoryError, RoleCatalog},
};
use crate::notification::domain::Notification;
use crate::project::{
    domain::{Project, ProjectId},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::store::Store;
use crate::user::{
    domain::UserId,
    ports::{UserRepository, UserRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for membership operations.
#[derive(Debug, Error)]
pub enum MembershipServiceError {
    /// The role name could not be parsed.
    #[error(transparent)]
    Domain(#[from] MembershipDomainError),
    /// Membership repository operation failed.
    #[error(transparent)]
    Repository(#[from] MembershipRepositoryError),
    /// The actor may not perform the operation.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// Project lookup failed.
    #[error(transparent)]
    Projects(#[from] ProjectRepositoryError),
    /// User lookup failed.
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The role is not present in the catalog.
    #[error("role not found: {0}")]
    RoleNotFound(RoleName),
    /// No catalog role carries the identifier.
    #[error("role not found: {0}")]
    RoleIdNotFound(RoleId),
    /// The user holds no membership in the project.
    #[error("user {user_id} is not a member of project {project_id}")]
    NotAMember {
        /// Project that was searched.
        project_id: ProjectId,
        /// User that was searched for.
        user_id: UserId,
    },
    /// The change would leave the project without an administrator.
    #[error("project {0} must keep at least one ADMIN member")]
    LastAdmin(ProjectId),
}

impl MembershipServiceError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_)
            | Self::ProjectNotFound(_)
            | Self::UserNotFound(_)
            | Self::RoleNotFound(_)
            | Self::RoleIdNotFound(_)
            | Self::Repository(MembershipRepositoryError::NotFound(_))
            | Self::Projects(ProjectRepositoryError::NotFound(_))
            | Self::Users(UserRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(MembershipRepositoryError::AlreadyMember { .. }) => {
                ErrorKind::AlreadyMember
            }
            Self::NotAMember { .. } => ErrorKind::NotAMember,
            Self::LastAdmin(_) => ErrorKind::ValidationFailed,
            Self::Access(err) => err.kind(),
            Self::Repository(_) | Self::Projects(_) | Self::Users(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for membership service operations.
pub type MembershipServiceResult<T> = Result<T, MembershipServiceError>;

/// Membership registry orchestration service.
#[derive(Clone)]
pub struct MembershipRegistryService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> MembershipRegistryService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    /// Creates a new membership registry service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Checks that `actor` may perform `action` in `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Access`] when the actor is not
    /// allowed.
    pub async fn authorize(
        &self,
        project_id: ProjectId,
        actor: Actor,
        action: ProjectAction,
    ) -> MembershipServiceResult<Option<Member>> {
        Ok(authorize(self.store.members(), project_id, actor, action).await?)
    }

    /// Enrolls a user in a project and notifies them.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError`] when the project, user or role is
    /// unknown, the actor lacks [`ProjectAction::ManageMembers`], or the user
    /// is already enrolled.
    pub async fn add_member(
        &self,
        actor: Actor,
        project_id: ProjectId,
        user_id: UserId,
        role_name: &str,
    ) -> MembershipServiceResult<Member> {
        let project = self.require_project(project_id).await?;
        self.authorize(project_id, actor, ProjectAction::ManageMembers)
            .await?;
        self.require_user(user_id).await?;
        let role = self.resolve_role(role_name).await?;

        if self.store.members().find(project_id, user_id).await?.is_some() {
            return Err(MembershipRepositoryError::AlreadyMember {
                project_id,
                user_id,
            }
            .into());
        }

        let member = Member::new(project_id, user_id, role.name(), &*self.clock);
        let notice = Notification::project_member_added(user_id, &project, &*self.clock);
        self.store.members().enroll(&member, &notice).await?;
        debug!(notification_id = %notice.id(), %user_id, "emitted notification");
        info!(%project_id, %user_id, role = %role.name(), %actor, "added project member");
        Ok(member)
    }

    /// Enrolls a project's creator as `ADMIN` without authorization or
    /// notification.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError`] when the project or user is unknown
    /// or the user is already enrolled.
    pub async fn enroll_creator(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipServiceResult<Member> {
        self.require_project(project_id).await?;
        self.require_user(user_id).await?;
        let member = Member::new(project_id, user_id, RoleName::Admin, &*self.clock);
        self.store.members().store(&member).await?;
        info!(%project_id, %user_id, "enrolled project creator");
        Ok(member)
    }

    /// Removes a user from a project.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::NotAMember`] when the user is not
    /// enrolled or [`MembershipServiceError::LastAdmin`] when they are the
    /// project's only administrator.
    pub async fn remove_member(
        &self,
        actor: Actor,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipServiceResult<()> {
        self.authorize(project_id, actor, ProjectAction::ManageMembers)
            .await?;
        let member = self.require_membership(project_id, user_id).await?;
        self.store
            .members()
            .delete(member.id())
            .await
            .map_err(refuse_last_admin)?;
        info!(%project_id, %user_id, %actor, "removed project member");
        Ok(())
    }

    /// Changes the role a user holds in a project.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::NotAMember`],
    /// [`MembershipServiceError::RoleNotFound`], or
    /// [`MembershipServiceError::LastAdmin`] when the change would demote the
    /// only administrator.
    pub async fn change_role(
        &self,
        actor: Actor,
        project_id: ProjectId,
        user_id: UserId,
        role_name: &str,
    ) -> MembershipServiceResult<Member> {
        self.authorize(project_id, actor, ProjectAction::ManageMembers)
            .await?;
        let member = self.require_membership(project_id, user_id).await?;
        let role = self.resolve_role(role_name).await?;
        self.apply_role(actor, member, role.name()).await
    }

    /// Changes the role of a membership addressed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipRepositoryError::NotFound`] (wrapped) for an
    /// unknown membership; nothing is changed in that case.
    pub async fn update_member_role(
        &self,
        actor: Actor,
        member_id: MemberId,
        role_name: &str,
    ) -> MembershipServiceResult<Member> {
        let member = self.find_member(member_id).await?;
        self.authorize(member.project_id(), actor, ProjectAction::ManageMembers)
            .await?;
        let role = self.resolve_role(role_name).await?;
        self.apply_role(actor, member, role.name()).await
    }

    /// Removes a membership addressed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipRepositoryError::NotFound`] (wrapped) for an
    /// unknown membership.
    pub async fn remove_member_by_id(
        &self,
        actor: Actor,
        member_id: MemberId,
    ) -> MembershipServiceResult<()> {
        let member = self.find_member(member_id).await?;
        self.authorize(member.project_id(), actor, ProjectAction::ManageMembers)
            .await?;
        self.store
            .members()
            .delete(member_id)
            .await
            .map_err(refuse_last_admin)?;
        info!(%member_id, project_id = %member.project_id(), %actor, "removed project member");
        Ok(())
    }

    /// Returns `true` when the user holds `role_name` in the project.
    ///
    /// Unknown role names and missing memberships yield `false`.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when the lookup fails.
    pub async fn has_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role_name: &str,
    ) -> MembershipServiceResult<bool> {
        let Ok(role) = RoleName::try_from(role_name) else {
            return Ok(false);
        };
        let member = self.store.members().find(project_id, user_id).await?;
        Ok(member.is_some_and(|m| m.role() == role))
    }

    /// Returns the membership of a user in a project, if any.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when the lookup fails.
    pub async fn membership(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipServiceResult<Option<Member>> {
        Ok(self.store.members().find(project_id, user_id).await?)
    }

    /// Returns `true` when the user is enrolled in the project.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when the lookup fails.
    pub async fn is_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipServiceResult<bool> {
        Ok(self.membership(project_id, user_id).await?.is_some())
    }

    /// Retrieves a membership by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipRepositoryError::NotFound`] (wrapped) when the
    /// membership does not exist.
    pub async fn find_member(&self, member_id: MemberId) -> MembershipServiceResult<Member> {
        self.store
            .members()
            .find_by_id(member_id)
            .await?
            .ok_or(MembershipServiceError::Repository(
                MembershipRepositoryError::NotFound(member_id),
            ))
    }

    /// Returns the members of a project.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when the lookup fails.
    pub async fn members_of_project(
        &self,
        project_id: ProjectId,
    ) -> MembershipServiceResult<Vec<Member>> {
        debug!(%project_id, "listing project members");
        Ok(self.store.members().list_by_project(project_id).await?)
    }

    /// Returns every membership held by a user.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when the lookup fails.
    pub async fn memberships_of_user(&self, user_id: UserId) -> MembershipServiceResult<Vec<Member>> {
        Ok(self.store.members().list_by_user(user_id).await?)
    }

    /// Returns memberships with the given role across every project.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::RoleNotFound`] or
    /// [`MembershipServiceError::Domain`] for an unknown role.
    pub async fn members_with_role(&self, role_name: &str) -> MembershipServiceResult<Vec<Member>> {
        let role = self.resolve_role(role_name).await?;
        Ok(self.store.members().list_by_role(role.name()).await?)
    }

    /// Counts the members of a project.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when the lookup fails.
    pub async fn member_count(&self, project_id: ProjectId) -> MembershipServiceResult<u64> {
        Ok(self.store.members().count_by_project(project_id).await?)
    }

    /// Lists the seeded role catalog.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Repository`] when the lookup fails.
    pub async fn roles(&self) -> MembershipServiceResult<Vec<Role>> {
        Ok(self.store.roles().list_roles().await?)
    }

    /// Resolves a role by its canonical name.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::Domain`] for names outside the
    /// catalog or [`MembershipServiceError::RoleNotFound`] when the role was
    /// not seeded.
    pub async fn role_by_name(&self, role_name: &str) -> MembershipServiceResult<Role> {
        self.resolve_role(role_name).await
    }

    /// Resolves a role by its catalog identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::RoleIdNotFound`] when no seeded role
    /// carries `role_id`.
    pub async fn role_by_id(&self, role_id: RoleId) -> MembershipServiceResult<Role> {
        self.store
            .roles()
            .find_role_by_id(role_id)
            .await?
            .ok_or(MembershipServiceError::RoleIdNotFound(role_id))
    }

    async fn resolve_role(&self, role_name: &str) -> MembershipServiceResult<Role> {
        let name = RoleName::try_from(role_name)?;
        self.store
            .roles()
            .find_role_by_name(name)
            .await?
            .ok_or(MembershipServiceError::RoleNotFound(name))
    }

    async fn require_project(&self, project_id: ProjectId) -> MembershipServiceResult<Project> {
        self.store
            .projects()
            .find_by_id(project_id)
            .await?
            .ok_or(MembershipServiceError::ProjectNotFound(project_id))
    }

    async fn require_user(&self, user_id: UserId) -> MembershipServiceResult<()> {
        self.store
            .users()
            .find_by_id(user_id)
            .await?
            .map(drop)
            .ok_or(MembershipServiceError::UserNotFound(user_id))
    }

    async fn require_membership(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipServiceResult<Member> {
        self.store
            .members()
            .find(project_id, user_id)
            .await?
            .ok_or(MembershipServiceError::NotAMember {
                project_id,
                user_id,
            })
    }

    async fn apply_role(
        &self,
        actor: Actor,
        mut member: Member,
        role: RoleName,
    ) -> MembershipServiceResult<Member> {
        member.change_role(role);
        self.store
            .members()
            .update(&member)
            .await
            .map_err(refuse_last_admin)?;
        info!(
            project_id = %member.project_id(),
            user_id = %member.user_id(),
            %role,
            %actor,
            "changed member role"
        );
        Ok(member)
    }
}

/// Lifts the repository's last-admin refusal into the service error.
fn refuse_last_admin(err: MembershipRepositoryError) -> MembershipServiceError {
    if let MembershipRepositoryError::LastAdmin(project_id) = err {
        warn!(%project_id, "refused to drop last project admin");
        return MembershipServiceError::LastAdmin(project_id);
    }
    err.into()
}
