//! Repository port for project persistence and lookup.

use crate::membership::domain::{Member, RoleName};
use crate::project::domain::{Project, ProjectId};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for project repository operations.
pub type ProjectRepositoryResult<T> = Result<T, ProjectRepositoryError>;

/// Project persistence contract.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a new project together with its creator's membership.
    ///
    /// Both records are written or neither is.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::DuplicateProject`] when the project
    /// identifier already exists.
    async fn create_with_owner(&self, project: &Project, owner: &Member)
    -> ProjectRepositoryResult<()>;

    /// Persists changes to an existing project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] when the project does not
    /// exist.
    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()>;

    /// Finds a project by identifier.
    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>>;

    /// Returns every project ordered by creation time.
    async fn list_all(&self) -> ProjectRepositoryResult<Vec<Project>>;

    /// Returns projects created by a user.
    async fn list_by_creator(&self, user_id: UserId) -> ProjectRepositoryResult<Vec<Project>>;

    /// Returns projects the user is enrolled in.
    async fn list_by_member(&self, user_id: UserId) -> ProjectRepositoryResult<Vec<Project>>;

    /// Returns projects in which the user holds `role`.
    async fn list_by_member_role(
        &self,
        user_id: UserId,
        role: RoleName,
    ) -> ProjectRepositoryResult<Vec<Project>>;

    /// Returns projects whose name contains `fragment`, ignoring case.
    async fn search_by_name(&self, fragment: &str) -> ProjectRepositoryResult<Vec<Project>>;

    /// Returns projects created at or after `since`, newest first.
    async fn list_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> ProjectRepositoryResult<Vec<Project>>;

    /// Deletes a project with its members, tasks and task history.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] when the project does not
    /// exist.
    async fn delete(&self, id: ProjectId) -> ProjectRepositoryResult<()>;
}

/// Errors returned by project repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProjectRepositoryError {
    /// A project with the same identifier already exists.
    #[error("duplicate project identifier: {0}")]
    DuplicateProject(ProjectId),

    /// The project was not found.
    #[error("project not found: {0}")]
    NotFound(ProjectId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProjectRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
