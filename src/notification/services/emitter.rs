//! Service layer for creating and managing notification records.

use crate::error::ErrorKind;
use crate::notification::{
    domain::{
        NewNotification, Notification, NotificationDomainError, NotificationId, NotificationType,
        RelatedEntity,
    },
    ports::{NotificationRepository, NotificationRepositoryError},
};
use crate::project::{
    domain::{Project, ProjectId},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::store::Store;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::user::{
    domain::UserId,
    ports::{UserRepository, UserRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for an ad hoc notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyRequest {
    user_id: UserId,
    title: String,
    message: String,
    notification_type: String,
    related: Option<RelatedEntity>,
}

impl NotifyRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            notification_type: notification_type.into(),
            related: None,
        }
    }

    /// Points the notification at a project or task.
    #[must_use]
    pub const fn with_related(mut self, related: RelatedEntity) -> Self {
        self.related = Some(related);
        self
    }
}

/// Service-level errors for notification operations.
#[derive(Debug, Error)]
pub enum NotificationServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] NotificationDomainError),
    /// Notification repository operation failed.
    #[error(transparent)]
    Repository(#[from] NotificationRepositoryError),
    /// User lookup failed.
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
    /// Task lookup failed.
    #[error(transparent)]
    Tasks(#[from] TaskRepositoryError),
    /// Project lookup failed.
    #[error(transparent)]
    Projects(#[from] ProjectRepositoryError),
    /// The recipient does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
}

impl NotificationServiceError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::ValidationFailed,
            Self::UserNotFound(_)
            | Self::TaskNotFound(_)
            | Self::ProjectNotFound(_)
            | Self::Repository(NotificationRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(NotificationRepositoryError::DuplicateNotification(_)) => {
                ErrorKind::AlreadyExists
            }
            Self::Repository(_) | Self::Users(_) | Self::Tasks(_) | Self::Projects(_) => {
                ErrorKind::Storage
            }
        }
    }
}

/// Result type for notification service operations.
pub type NotificationServiceResult<T> = Result<T, NotificationServiceError>;

/// Notification emitter service.
#[derive(Clone)]
pub struct NotificationEmitterService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> NotificationEmitterService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    /// Creates a new notification emitter service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a notification for a user.
    ///
    /// A related task also sets the project context to the task's project.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Domain`] for blank text or a
    /// malformed type tag, or a `*NotFound` variant when the recipient or
    /// related entity does not resolve.
    pub async fn notify(&self, request: NotifyRequest) -> NotificationServiceResult<Notification> {
        let NotifyRequest {
            user_id,
            title,
            message,
            notification_type: type_tag,
            related,
        } = request;
        let notification_type = NotificationType::new(type_tag)?;
        self.require_user(user_id).await?;

        let project_id = match related {
            Some(RelatedEntity::Task(task_id)) => Some(self.require_task(task_id).await?.project_id()),
            Some(RelatedEntity::Project(project_id)) => {
                Some(self.require_project(project_id).await?.id())
            }
            None => None,
        };

        let notification = Notification::new(
            NewNotification {
                user_id,
                title,
                message,
                notification_type,
                project_id,
                related,
            },
            &*self.clock,
        )?;
        self.persist(notification).await
    }

    /// Notifies `user_id` that a task was assigned to them.
    ///
    /// # Errors
    ///
    /// Returns a `*NotFound` variant when the user or task does not resolve.
    pub async fn task_assigned(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> NotificationServiceResult<Notification> {
        self.require_user(user_id).await?;
        let task = self.require_task(task_id).await?;
        self.persist(Notification::task_assigned(user_id, &task, &*self.clock))
            .await
    }

    /// Notifies `user_id` that a task moved to `status`.
    ///
    /// # Errors
    ///
    /// Returns a `*NotFound` variant when the user or task does not resolve.
    pub async fn task_status_changed(
        &self,
        user_id: UserId,
        task_id: TaskId,
        status: TaskStatus,
    ) -> NotificationServiceResult<Notification> {
        self.require_user(user_id).await?;
        let task = self.require_task(task_id).await?;
        self.persist(Notification::task_status_changed(
            user_id,
            &task,
            status,
            &*self.clock,
        ))
        .await
    }

    /// Notifies `user_id` that they were added to a project.
    ///
    /// # Errors
    ///
    /// Returns a `*NotFound` variant when the user or project does not
    /// resolve.
    pub async fn project_member_added(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> NotificationServiceResult<Notification> {
        self.require_user(user_id).await?;
        let project = self.require_project(project_id).await?;
        self.persist(Notification::project_member_added(
            user_id,
            &project,
            &*self.clock,
        ))
        .await
    }

    /// Retrieves a notification by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::NotFound`] (wrapped) when the
    /// notification does not exist.
    pub async fn get(&self, id: NotificationId) -> NotificationServiceResult<Notification> {
        self.store
            .notifications()
            .find_by_id(id)
            .await?
            .ok_or(NotificationServiceError::Repository(
                NotificationRepositoryError::NotFound(id),
            ))
    }

    /// Marks one notification read.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::NotFound`] (wrapped) when the
    /// notification does not exist.
    pub async fn mark_read(&self, id: NotificationId) -> NotificationServiceResult<Notification> {
        let notification = self.store.notifications().mark_read(id).await?;
        debug!(notification_id = %id, "marked notification read");
        Ok(notification)
    }

    /// Marks every notification of a user read and returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Repository`] when the update fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> NotificationServiceResult<u64> {
        let changed = self.store.notifications().mark_all_read(user_id).await?;
        info!(%user_id, changed, "marked notifications read");
        Ok(changed)
    }

    /// Deletes one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::NotFound`] (wrapped) when the
    /// notification does not exist.
    pub async fn delete(&self, id: NotificationId) -> NotificationServiceResult<()> {
        self.store.notifications().delete(id).await?;
        info!(notification_id = %id, "deleted notification");
        Ok(())
    }

    /// Deletes every notification of a user and returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Repository`] when the deletion
    /// fails.
    pub async fn delete_for_user(&self, user_id: UserId) -> NotificationServiceResult<u64> {
        let removed = self.store.notifications().delete_by_user(user_id).await?;
        info!(%user_id, removed, "deleted user notifications");
        Ok(removed)
    }

    /// Returns a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Repository`] when the lookup fails.
    pub async fn for_user(&self, user_id: UserId) -> NotificationServiceResult<Vec<Notification>> {
        Ok(self.store.notifications().list_by_user(user_id, false).await?)
    }

    /// Returns a user's unread notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Repository`] when the lookup fails.
    pub async fn unread_for_user(
        &self,
        user_id: UserId,
    ) -> NotificationServiceResult<Vec<Notification>> {
        Ok(self.store.notifications().list_by_user(user_id, true).await?)
    }

    /// Counts a user's unread notifications.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Repository`] when the lookup fails.
    pub async fn unread_count(&self, user_id: UserId) -> NotificationServiceResult<u64> {
        Ok(self.store.notifications().count_unread(user_id).await?)
    }

    /// Returns notifications concerning a project.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Repository`] when the lookup fails.
    pub async fn for_project(
        &self,
        project_id: ProjectId,
    ) -> NotificationServiceResult<Vec<Notification>> {
        Ok(self.store.notifications().list_by_project(project_id).await?)
    }

    /// Returns notifications pointing at a task.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Repository`] when the lookup fails.
    pub async fn for_task(&self, task_id: TaskId) -> NotificationServiceResult<Vec<Notification>> {
        Ok(self.store.notifications().list_by_task(task_id).await?)
    }

    /// Returns a user's notifications with the given type tag.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationServiceError::Domain`] for a malformed tag.
    pub async fn for_user_and_type(
        &self,
        user_id: UserId,
        type_tag: &str,
    ) -> NotificationServiceResult<Vec<Notification>> {
        let notification_type = NotificationType::new(type_tag)?;
        Ok(self
            .store
            .notifications()
            .list_by_user_and_type(user_id, &notification_type)
            .await?)
    }

    async fn persist(&self, notification: Notification) -> NotificationServiceResult<Notification> {
        self.store.notifications().store(&notification).await?;
        info!(
            notification_id = %notification.id(),
            user_id = %notification.user_id(),
            notification_type = %notification.notification_type(),
            "created notification"
        );
        Ok(notification)
    }

    async fn require_user(&self, user_id: UserId) -> NotificationServiceResult<()> {
        self.store
            .users()
            .find_by_id(user_id)
            .await?
            .map(drop)
            .ok_or(NotificationServiceError::UserNotFound(user_id))
    }

    async fn require_task(&self, task_id: TaskId) -> NotificationServiceResult<Task> {
        self.store
            .tasks()
            .find_by_id(task_id)
            .await?
            .ok_or(NotificationServiceError::TaskNotFound(task_id))
    }

    async fn require_project(&self, project_id: ProjectId) -> NotificationServiceResult<Project> {
        self.store
            .projects()
            .find_by_id(project_id)
            .await?
            .ok_or(NotificationServiceError::ProjectNotFound(project_id))
    }
}
