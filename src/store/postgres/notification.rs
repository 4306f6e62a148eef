//! `PostgreSQL` notification repository.

use super::{
    PgPool, affected, count,
    models::{NewNotificationRow, NotificationRow},
    run_blocking,
    schema::notifications,
};
use crate::notification::{
    domain::{
        Notification, NotificationId, NotificationType, PersistedNotificationData, RelatedEntity,
    },
    ports::{NotificationRepository, NotificationRepositoryError, NotificationRepositoryResult},
};
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed notification repository.
#[derive(Debug, Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_where<F>(&self, query: F) -> NotificationRepositoryResult<Vec<Notification>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<NotificationRow>> + Send + 'static,
    {
        run_blocking(&self.pool, move |connection| {
            query(connection)
                .map_err(NotificationRepositoryError::persistence)?
                .into_iter()
                .map(row_to_notification)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn store(&self, notification: &Notification) -> NotificationRepositoryResult<()> {
        let row = to_notification_row(notification);
        let notification_id = notification.id();
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(notifications::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        NotificationRepositoryError::DuplicateNotification(notification_id)
                    }
                    _ => NotificationRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: NotificationId,
    ) -> NotificationRepositoryResult<Option<Notification>> {
        run_blocking(&self.pool, move |connection| {
            notifications::table
                .find(id.into_inner())
                .select(NotificationRow::as_select())
                .first(connection)
                .optional()
                .map_err(NotificationRepositoryError::persistence)?
                .map(row_to_notification)
                .transpose()
        })
        .await
    }

    async fn mark_read(&self, id: NotificationId) -> NotificationRepositoryResult<Notification> {
        run_blocking(&self.pool, move |connection| {
            let row = diesel::update(notifications::table.find(id.into_inner()))
                .set(notifications::is_read.eq(true))
                .returning(NotificationRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(NotificationRepositoryError::persistence)?
                .ok_or(NotificationRepositoryError::NotFound(id))?;
            row_to_notification(row)
        })
        .await
    }

    async fn mark_all_read(&self, user_id: UserId) -> NotificationRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            diesel::update(
                notifications::table
                    .filter(notifications::user_id.eq(user_id.into_inner()))
                    .filter(notifications::is_read.eq(false)),
            )
            .set(notifications::is_read.eq(true))
            .execute(connection)
            .map(affected)
            .map_err(NotificationRepositoryError::persistence)
        })
        .await
    }

    async fn list_by_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        self.load_where(move |connection| {
            let mut query = notifications::table
                .select(NotificationRow::as_select())
                .filter(notifications::user_id.eq(user_id.into_inner()))
                .into_boxed();
            if unread_only {
                query = query.filter(notifications::is_read.eq(false));
            }
            query
                .order((notifications::created_at.desc(), notifications::id.desc()))
                .load(connection)
        })
        .await
    }

    async fn count_unread(&self, user_id: UserId) -> NotificationRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            notifications::table
                .filter(notifications::user_id.eq(user_id.into_inner()))
                .filter(notifications::is_read.eq(false))
                .count()
                .get_result::<i64>(connection)
                .map(count)
                .map_err(NotificationRepositoryError::persistence)
        })
        .await
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let related = RelatedEntity::Project(project_id);
        self.load_where(move |connection| {
            notifications::table
                .filter(
                    notifications::project_id.eq(project_id.into_inner()).or(
                        notifications::related_entity_type
                            .eq(related.entity_type())
                            .and(notifications::related_entity_id.eq(related.entity_id())),
                    ),
                )
                .order((notifications::created_at.desc(), notifications::id.desc()))
                .select(NotificationRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_task(
        &self,
        task_id: TaskId,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let related = RelatedEntity::Task(task_id);
        self.load_where(move |connection| {
            notifications::table
                .filter(notifications::related_entity_type.eq(related.entity_type()))
                .filter(notifications::related_entity_id.eq(related.entity_id()))
                .order((notifications::created_at.desc(), notifications::id.desc()))
                .select(NotificationRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_user_and_type(
        &self,
        user_id: UserId,
        notification_type: &NotificationType,
    ) -> NotificationRepositoryResult<Vec<Notification>> {
        let type_tag = notification_type.as_str().to_owned();
        self.load_where(move |connection| {
            notifications::table
                .filter(notifications::user_id.eq(user_id.into_inner()))
                .filter(notifications::notification_type.eq(type_tag))
                .order((notifications::created_at.desc(), notifications::id.desc()))
                .select(NotificationRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn delete(&self, id: NotificationId) -> NotificationRepositoryResult<()> {
        run_blocking(&self.pool, move |connection| {
            let deleted = diesel::delete(notifications::table.find(id.into_inner()))
                .execute(connection)
                .map_err(NotificationRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(NotificationRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_by_user(&self, user_id: UserId) -> NotificationRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            diesel::delete(
                notifications::table.filter(notifications::user_id.eq(user_id.into_inner())),
            )
            .execute(connection)
            .map(affected)
            .map_err(NotificationRepositoryError::persistence)
        })
        .await
    }
}

pub(super) fn to_notification_row(notification: &Notification) -> NewNotificationRow {
    let related = notification.related();
    NewNotificationRow {
        id: notification.id().into_inner(),
        user_id: notification.user_id().into_inner(),
        title: notification.title().to_owned(),
        message: notification.message().to_owned(),
        notification_type: notification.notification_type().as_str().to_owned(),
        is_read: notification.is_read(),
        project_id: notification.project_id().map(ProjectId::into_inner),
        related_entity_type: related.map(|entity| entity.entity_type().to_owned()),
        related_entity_id: related.map(RelatedEntity::entity_id),
        created_at: notification.created_at(),
    }
}

fn row_to_notification(row: NotificationRow) -> NotificationRepositoryResult<Notification> {
    let NotificationRow {
        id,
        user_id,
        title,
        message,
        notification_type,
        is_read,
        project_id,
        related_entity_type,
        related_entity_id,
        created_at,
    } = row;
    let related = match (related_entity_type, related_entity_id) {
        (Some(entity_type), Some(entity_id)) => Some(
            RelatedEntity::from_parts(&entity_type, entity_id)
                .map_err(NotificationRepositoryError::persistence)?,
        ),
        _ => None,
    };
    Ok(Notification::from_persisted(PersistedNotificationData {
        id: NotificationId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        title,
        message,
        notification_type: NotificationType::new(notification_type)
            .map_err(NotificationRepositoryError::persistence)?,
        read: is_read,
        project_id: project_id.map(ProjectId::from_uuid),
        related,
        created_at,
    }))
}
