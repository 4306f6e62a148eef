//! Notification aggregate and the lifecycle events that produce it.

use super::{NotificationDomainError, NotificationId, NotificationType, RelatedEntity};
use crate::project::domain::{Project, ProjectId};
use crate::task::domain::{Task, TaskStatus};
use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Message addressed to one user. Delivery happens outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    user_id: UserId,
    title: String,
    message: String,
    notification_type: NotificationType,
    read: bool,
    project_id: Option<ProjectId>,
    related: Option<RelatedEntity>,
    created_at: DateTime<Utc>,
}

/// Parameter object for creating a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Type tag.
    pub notification_type: NotificationType,
    /// Project the notification concerns, if any.
    pub project_id: Option<ProjectId>,
    /// Entity the notification points at, if any.
    pub related: Option<RelatedEntity>,
}

/// Parameter object for reconstructing a persisted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNotificationData {
    /// Persisted identifier.
    pub id: NotificationId,
    /// Persisted recipient.
    pub user_id: UserId,
    /// Persisted title.
    pub title: String,
    /// Persisted message.
    pub message: String,
    /// Persisted type tag.
    pub notification_type: NotificationType,
    /// Persisted read flag.
    pub read: bool,
    /// Persisted project context.
    pub project_id: Option<ProjectId>,
    /// Persisted related entity.
    pub related: Option<RelatedEntity>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates an unread notification.
    ///
    /// Title and message are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::EmptyTitle`] or
    /// [`NotificationDomainError::EmptyMessage`] for blank text.
    pub fn new(data: NewNotification, clock: &impl Clock) -> Result<Self, NotificationDomainError> {
        let title = data.title.trim();
        if title.is_empty() {
            return Err(NotificationDomainError::EmptyTitle);
        }
        let message = data.message.trim();
        if message.is_empty() {
            return Err(NotificationDomainError::EmptyMessage);
        }
        Ok(Self {
            id: NotificationId::new(),
            user_id: data.user_id,
            title: title.to_owned(),
            message: message.to_owned(),
            notification_type: data.notification_type,
            read: false,
            project_id: data.project_id,
            related: data.related,
            created_at: clock.utc(),
        })
    }

    /// Builds the notice sent to a task's new assignee.
    #[must_use]
    pub fn task_assigned(recipient: UserId, task: &Task, clock: &impl Clock) -> Self {
        Self::event(
            recipient,
            "New task assigned",
            format!("You have been assigned to the task: {}", task.title()),
            NotificationType::task_assigned(),
            Some(task.project_id()),
            RelatedEntity::Task(task.id()),
            clock,
        )
    }

    /// Builds the notice sent when a task moves to `status`.
    #[must_use]
    pub fn task_status_changed(
        recipient: UserId,
        task: &Task,
        status: TaskStatus,
        clock: &impl Clock,
    ) -> Self {
        Self::event(
            recipient,
            "Task status changed",
            format!("The status of task '{}' changed to: {status}", task.title()),
            NotificationType::task_status_changed(),
            Some(task.project_id()),
            RelatedEntity::Task(task.id()),
            clock,
        )
    }

    /// Builds the notice sent to a user added to a project.
    #[must_use]
    pub fn project_member_added(recipient: UserId, project: &Project, clock: &impl Clock) -> Self {
        Self::event(
            recipient,
            "Added to project",
            format!("You have been added to the project: {}", project.name()),
            NotificationType::project_member_added(),
            Some(project.id()),
            RelatedEntity::Project(project.id()),
            clock,
        )
    }

    fn event(
        user_id: UserId,
        title: &str,
        message: String,
        notification_type: NotificationType,
        project_id: Option<ProjectId>,
        related: RelatedEntity,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            title: title.to_owned(),
            message,
            notification_type,
            read: false,
            project_id,
            related: Some(related),
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a notification from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedNotificationData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            title: data.title,
            message: data.message,
            notification_type: data.notification_type,
            read: data.read,
            project_id: data.project_id,
            related: data.related,
            created_at: data.created_at,
        }
    }

    /// Returns the notification identifier.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the message body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the type tag.
    #[must_use]
    pub const fn notification_type(&self) -> &NotificationType {
        &self.notification_type
    }

    /// Returns `true` once the recipient has read the notification.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.read
    }

    /// Returns the project context, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the related entity, if any.
    #[must_use]
    pub const fn related(&self) -> Option<RelatedEntity> {
        self.related
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks the notification read.
    pub const fn mark_read(&mut self) {
        self.read = true;
    }
}
