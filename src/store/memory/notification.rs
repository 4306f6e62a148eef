//! In-memory notification repository.

use super::{SharedState, count, read_state, write_state};
use crate::notification::{
    domain::{Notification, NotificationId, NotificationType, RelatedEntity},
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use std::cmp::Reverse;

/// Notification repository over the shared in-memory state.
#[derive(Debug, Clone)]
pub struct InMemoryNotificationRepository {
    state: SharedState,
}

impl InMemoryNotificationRepository {
    pub(super) const fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Returns matching notifications, newest first.
    fn collect_where(
        &self,
        predicate: impl Fn(&Notification) -> bool,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let state = read_state(&self.state, NotificationRepositoryError::persistence)?;
        let mut notifications: Vec<Notification> = state
            .notifications
            .iter()
            .rev()
            .filter(|notification| predicate(notification))
            .cloned()
            .collect();
        notifications.sort_by_key(|notification| Reverse(notification.created_at()));
        Ok(notifications)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        let mut state = write_state(&self.state, NotificationRepositoryError::persistence)?;
        if state
            .notifications
            .iter()
            .any(|existing| existing.id() == notification.id())
        {
            return Err(NotificationRepositoryError::DuplicateNotification(
                notification.id(),
            ));
        }
        state.notifications.push(notification.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        let state = read_state(&self.state, NotificationRepositoryError::persistence)?;
        Ok(state
            .notifications
            .iter()
            .find(|notification| notification.id() == id)
            .cloned())
    }

    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<Notification> {
        let mut state = write_state(&self.state, NotificationRepositoryError::persistence)?;
        let stored = state
            .notifications
            .iter_mut()
            .find(|notification| notification.id() == id)
            .ok_or(NotificationRepositoryError::NotFound(id))?;
        stored.mark_read();
        Ok(stored.clone())
    }

    async fn mark_all_read(&self, user_id: UserId) -> NotificationRepositoryResult<u64> {
        let mut state = write_state(&self.state, NotificationRepositoryError::persistence)?;
        let mut updated = 0_usize;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|notification| notification.user_id() == user_id && !notification.is_read())
        {
            notification.mark_read();
            updated += 1;
        }
        Ok(count(updated))
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        self.collect_where(|notification| {
            notification.user_id() == user_id && !(unread_only && notification.is_read())
        })
    }

    async fn count_unread(&self, user_id: UserId) -> NotificationRepositoryResult<u64> {
        let state = read_state(&self.state, NotificationRepositoryError::persistence)?;
        Ok(count(
            state
                .notifications
                .iter()
                .filter(|notification| notification.user_id() == user_id && !notification.is_read())
                .count(),
        ))
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        self.collect_where(|notification| {
            notification.project_id() == Some(project_id)
                || notification.related() == Some(RelatedEntity::Project(project_id))
        })
    }

    async fn list_by_task(
        &self,
        task_id: TaskId,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        self.collect_where(|notification| {
            notification.related() == Some(RelatedEntity::Task(task_id))
        })
    }

    async fn list_by_user_and_type(
        &self,
        user_id: UserId,
        notification_type: &NotificationType,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        self.collect_where(|notification| {
            notification.user_id() == user_id
                && notification.notification_type() == notification_type
        })
    }

    async fn delete(&self, id: NotificationId) -> NotificationRepositoryResult<()> {
        let mut state = write_state(&self.state, NotificationRepositoryError::persistence)?;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|notification| notification.id() != id);
        if state.notifications.len() == before {
            return Err(NotificationRepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: UserId) -> NotificationRepositoryResult<u64> {
        let mut state = write_state(&self.state, NotificationRepositoryError::persistence)?;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|notification| notification.user_id() != user_id);
        Ok(count(before - state.notifications.len()))
    }
}
