//! Service layer for projects and their read model.

use crate::error::ErrorKind;
use crate::membership::{
    domain::{Actor, Member, MembershipDomainError, ProjectAction, RoleName},
    ports::{MembershipRepository, MembershipRepositoryError},
    services::{AccessError, MembershipRegistryService, MembershipServiceError, authorize},
};
use crate::patch::FieldUpdate;
use crate::project::{
    domain::{Project, ProjectDomainError, ProjectId, ProjectName, ProjectOverview, ProjectPatch},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::store::Store;
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::user::{
    domain::UserId,
    ports::{UserRepository, UserRepositoryError},
};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    name: String,
    description: Option<String>,
    start_date: Option<NaiveDate>,
}

impl CreateProjectRequest {
    /// Creates a request with the required name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            start_date: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the start date.
    #[must_use]
    pub const fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }
}

/// Request payload for patching a project. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProjectRequest {
    name: Option<String>,
    description: FieldUpdate<String>,
    start_date: FieldUpdate<NaiveDate>,
}

impl UpdateProjectRequest {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets, clears or keeps the description.
    #[must_use]
    pub fn with_description(mut self, description: FieldUpdate<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets, clears or keeps the start date.
    #[must_use]
    pub fn with_start_date(mut self, start_date: FieldUpdate<NaiveDate>) -> Self {
        self.start_date = start_date;
        self
    }
}

/// Service-level errors for project operations.
#[derive(Debug, Error)]
pub enum ProjectServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ProjectDomainError),
    /// The role name could not be parsed.
    #[error(transparent)]
    Role(#[from] MembershipDomainError),
    /// Project repository operation failed.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),
    /// The actor may not perform the operation.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// A delegated membership operation failed.
    #[error(transparent)]
    Membership(#[from] MembershipServiceError),
    /// Membership lookup failed.
    #[error(transparent)]
    Members(#[from] MembershipRepositoryError),
    /// Task lookup failed.
    #[error(transparent)]
    Tasks(#[from] TaskRepositoryError),
    /// User lookup failed.
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
    /// The creator does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
}

impl ProjectServiceError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::ValidationFailed,
            Self::Role(_)
            | Self::UserNotFound(_)
            | Self::Repository(ProjectRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(ProjectRepositoryError::DuplicateProject(_)) => {
                ErrorKind::AlreadyExists
            }
            Self::Access(err) => err.kind(),
            Self::Membership(err) => err.kind(),
            Self::Repository(_) | Self::Members(_) | Self::Tasks(_) | Self::Users(_) => {
                ErrorKind::Storage
            }
        }
    }
}

/// Result type for project service operations.
pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project orchestration service.
#[derive(Clone)]
pub struct ProjectManagementService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    registry: MembershipRegistryService<S, C>,
}

impl<S, C> ProjectManagementService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    /// Creates a new project management service.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        let registry = MembershipRegistryService::new(Arc::clone(&store), Arc::clone(&clock));
        Self {
            store,
            clock,
            registry,
        }
    }

    /// Creates a project and enrolls `creator` as its `ADMIN`.
    ///
    /// The project and the membership are written in one store call.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Domain`] for an invalid name or
    /// [`ProjectServiceError::UserNotFound`] for an unknown creator.
    pub async fn create(
        &self,
        request: CreateProjectRequest,
        creator: UserId,
    ) -> ProjectServiceResult<ProjectOverview> {
        let CreateProjectRequest {
            name: raw_name,
            description,
            start_date,
        } = request;
        let name = ProjectName::new(raw_name)?;
        if self.store.users().find_by_id(creator).await?.is_none() {
            return Err(ProjectServiceError::UserNotFound(creator));
        }

        let project = Project::new(name, description, start_date, creator, &*self.clock);
        let owner = Member::new(project.id(), creator, RoleName::Admin, &*self.clock);
        self.store
            .projects()
            .create_with_owner(&project, &owner)
            .await?;

        info!(project_id = %project.id(), %creator, "created project");
        self.overview(project).await
    }

    /// Retrieves a project with live counts.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] (wrapped) when the project
    /// does not exist.
    pub async fn get(&self, project_id: ProjectId) -> ProjectServiceResult<ProjectOverview> {
        let project = self.require_project(project_id).await?;
        self.overview(project).await
    }

    /// Returns every project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when the lookup fails.
    pub async fn list(&self) -> ProjectServiceResult<Vec<Project>> {
        Ok(self.store.projects().list_all().await?)
    }

    /// Returns projects created by a user.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when the lookup fails.
    pub async fn list_created_by(&self, user_id: UserId) -> ProjectServiceResult<Vec<Project>> {
        Ok(self.store.projects().list_by_creator(user_id).await?)
    }

    /// Returns projects the user is enrolled in.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when the lookup fails.
    pub async fn list_for_member(&self, user_id: UserId) -> ProjectServiceResult<Vec<Project>> {
        Ok(self.store.projects().list_by_member(user_id).await?)
    }

    /// Returns projects in which the user holds `role_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Role`] for an unknown role name.
    pub async fn list_for_member_with_role(
        &self,
        user_id: UserId,
        role_name: &str,
    ) -> ProjectServiceResult<Vec<Project>> {
        let role = RoleName::try_from(role_name)?;
        Ok(self.store.projects().list_by_member_role(user_id, role).await?)
    }

    /// Returns projects whose name contains `fragment`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when the lookup fails.
    pub async fn search_by_name(&self, fragment: &str) -> ProjectServiceResult<Vec<Project>> {
        debug!(fragment, "searching projects by name");
        Ok(self.store.projects().search_by_name(fragment.trim()).await?)
    }

    /// Returns projects created within the last `days` days, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when the lookup fails.
    pub async fn list_recent(&self, days: u32) -> ProjectServiceResult<Vec<Project>> {
        let now = self.clock.utc();
        let since = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(self.store.projects().list_created_since(since).await?)
    }

    /// Applies a partial update to a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError`] when the project does not exist, the
    /// new name is invalid, or the actor lacks [`ProjectAction::EditProject`].
    pub async fn update(
        &self,
        actor: Actor,
        project_id: ProjectId,
        request: UpdateProjectRequest,
    ) -> ProjectServiceResult<Project> {
        let mut project = self.require_project(project_id).await?;
        authorize(self.store.members(), project_id, actor, ProjectAction::EditProject).await?;

        let UpdateProjectRequest {
            name: raw_name,
            description,
            start_date,
        } = request;
        let patch = ProjectPatch {
            name: raw_name.map(ProjectName::new).transpose()?,
            description,
            start_date,
        };
        project.apply(patch, &*self.clock);
        self.store.projects().update(&project).await?;

        info!(%project_id, %actor, "updated project");
        Ok(project)
    }

    /// Deletes a project with its members, tasks and task history.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError`] when the project does not exist or the
    /// actor lacks [`ProjectAction::DeleteProject`].
    pub async fn delete(&self, actor: Actor, project_id: ProjectId) -> ProjectServiceResult<()> {
        self.require_project(project_id).await?;
        authorize(self.store.members(), project_id, actor, ProjectAction::DeleteProject).await?;
        self.store.projects().delete(project_id).await?;
        info!(%project_id, %actor, "deleted project");
        Ok(())
    }

    /// Adds a member to a project. See
    /// [`MembershipRegistryService::add_member`].
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Membership`] when the registry rejects
    /// the change.
    pub async fn add_member(
        &self,
        actor: Actor,
        project_id: ProjectId,
        user_id: UserId,
        role_name: &str,
    ) -> ProjectServiceResult<Member> {
        Ok(self
            .registry
            .add_member(actor, project_id, user_id, role_name)
            .await?)
    }

    /// Removes a member from a project. See
    /// [`MembershipRegistryService::remove_member`].
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Membership`] when the registry rejects
    /// the change.
    pub async fn remove_member(
        &self,
        actor: Actor,
        project_id: ProjectId,
        user_id: UserId,
    ) -> ProjectServiceResult<()> {
        Ok(self
            .registry
            .remove_member(actor, project_id, user_id)
            .await?)
    }

    /// Changes a member's role. See
    /// [`MembershipRegistryService::change_role`].
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Membership`] when the registry rejects
    /// the change.
    pub async fn change_member_role(
        &self,
        actor: Actor,
        project_id: ProjectId,
        user_id: UserId,
        role_name: &str,
    ) -> ProjectServiceResult<Member> {
        Ok(self
            .registry
            .change_role(actor, project_id, user_id, role_name)
            .await?)
    }

    async fn require_project(&self, project_id: ProjectId) -> ProjectServiceResult<Project> {
        self.store
            .projects()
            .find_by_id(project_id)
            .await?
            .ok_or(ProjectServiceError::Repository(
                ProjectRepositoryError::NotFound(project_id),
            ))
    }

    async fn overview(&self, project: Project) -> ProjectServiceResult<ProjectOverview> {
        let project_id = project.id();
        let members = self.store.members().list_by_project(project_id).await?;
        let member_count = self.store.members().count_by_project(project_id).await?;
        let task_count = self.store.tasks().count_by_project(project_id).await?;
        let tasks_by_status = self.store.tasks().count_by_status(project_id).await?;
        Ok(ProjectOverview {
            project,
            members,
            task_count,
            member_count,
            tasks_by_status,
        })
    }
}
