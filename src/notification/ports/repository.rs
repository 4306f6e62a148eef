//! Repository port for notification records.

use crate::notification::domain::{Notification, NotificationId, NotificationType};
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification repository operations.
pub type NotificationRepositoryResult<T> = Result<T, NotificationRepositoryError>;

/// Notification persistence contract.
///
/// Lists are returned newest first.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores a new notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::DuplicateNotification`] when the
    /// identifier already exists.
    async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()>;

    /// Finds a notification by identifier.
    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>>;

    /// Marks one notification read and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::NotFound`] when the notification
    /// does not exist.
    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<Notification>;

    /// Marks every unread notification of a user read and returns how many
    /// changed.
    async fn mark_all_read(&self, user_id: UserId) -> NotificationRepositoryResult<u64>;

    /// Returns a user's notifications, optionally only unread ones.
    async fn list_by_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> NotificationRepositoryResult<Vec<Notification>>;

    /// Counts a user's unread notifications.
    async fn count_unread(&self, user_id: UserId) -> NotificationRepositoryResult<u64>;

    /// Returns notifications concerning a project.
    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> NotificationRepositoryResult<Vec<Notification>>;

    /// Returns notifications pointing at a task.
    async fn list_by_task(&self, task_id: TaskId)
    -> NotificationRepositoryResult<Vec<Notification>>;

    /// Returns a user's notifications with the given type tag.
    async fn list_by_user_and_type(
        &self,
        user_id: UserId,
        notification_type: &NotificationType,
    ) -> NotificationRepositoryResult<Vec<Notification>>;

    /// Deletes one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRepositoryError::NotFound`] when the notification
    /// does not exist.
    async fn delete(&self, id: NotificationId) -> NotificationRepositoryResult<()>;

    /// Deletes every notification of a user and returns how many were
    /// removed.
    async fn delete_by_user(&self, user_id: UserId) -> NotificationRepositoryResult<u64>;
}

/// Errors returned by notification repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NotificationRepositoryError {
    /// A notification with the same identifier already exists.
    #[error("duplicate notification identifier: {0}")]
    DuplicateNotification(NotificationId),

    /// The notification was not found.
    #[error("notification not found: {0}")]
    NotFound(NotificationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
