//! `PostgreSQL` task repository.

use super::{
    PgPool, TxError, contains_pattern, count,
    history::to_history_row,
    insert_effects,
    models::{NewHistoryRow, NewNotificationRow, NewTaskRow, TaskRow},
    notification::to_notification_row,
    run_blocking,
    schema::tasks,
};
use crate::history::domain::HistoryEntry;
use crate::project::domain::ProjectId;
use crate::task::{
    domain::{PersistedTaskData, Task, TaskId, TaskPriority, TaskStatus, TaskTitle},
    ports::{TaskEffects, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeMap;

/// Statuses that count as closed for overdue and due-soon queries.
const CLOSED_STATUSES: [&str; 2] = ["DONE", "CANCELLED"];

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_where<F>(&self, query: F) -> TaskRepositoryResult<Vec<Task>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<TaskRow>> + Send + 'static,
    {
        run_blocking(&self.pool, move |connection| {
            query(connection)
                .map_err(TaskRepositoryError::persistence)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, task: &Task, effects: &TaskEffects) -> TaskRepositoryResult<()> {
        let row = to_row(task);
        let (history, notices) = effect_rows(effects);
        let task_id = task.id();
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, DieselError, _>(|tx| {
                    diesel::insert_into(tasks::table).values(&row).execute(tx)?;
                    insert_effects(tx, &history, &notices)
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.table_name() == Some("tasks") =>
                    {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })
        })
        .await
    }

    async fn update(&self, task: &Task, effects: &TaskEffects) -> TaskRepositoryResult<()> {
        let row = to_row(task);
        let (history, notices) = effect_rows(effects);
        let task_id = task.id();
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, TxError<TaskRepositoryError>, _>(|tx| {
                    let updated = diesel::update(tasks::table.find(row.id))
                        .set(&row)
                        .execute(tx)?;
                    if updated == 0 {
                        return Err(TxError::Rejected(TaskRepositoryError::NotFound(task_id)));
                    }
                    insert_effects(tx, &history, &notices)?;
                    Ok(())
                })
                .map_err(TxError::resolve)
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        run_blocking(&self.pool, move |connection| {
            tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?
                .map(row_to_task)
                .transpose()
        })
        .await
    }

    async fn list_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        self.load_where(move |connection| {
            tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_assignee(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.load_where(move |connection| {
            tasks::table
                .filter(tasks::assignee_id.eq(user_id.into_inner()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_creator(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.load_where(move |connection| {
            tasks::table
                .filter(tasks::creator_id.eq(user_id.into_inner()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_project_and_status(
        &self,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.load_where(move |connection| {
            tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .filter(tasks::status.eq(status.as_str()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_overdue(
        &self,
        today: NaiveDate,
        assignee: Option<UserId>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.load_where(move |connection| {
            let mut query = tasks::table
                .select(TaskRow::as_select())
                .filter(tasks::due_date.lt(today))
                .filter(tasks::status.ne_all(CLOSED_STATUSES))
                .into_boxed();
            if let Some(user_id) = assignee {
                query = query.filter(tasks::assignee_id.eq(user_id.into_inner()));
            }
            query
                .order((tasks::due_date.asc(), tasks::created_at.asc(), tasks::id.asc()))
                .load(connection)
        })
        .await
    }

    async fn list_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.load_where(move |connection| {
            tasks::table
                .filter(tasks::due_date.between(from, to))
                .filter(tasks::status.ne_all(CLOSED_STATUSES))
                .order((tasks::due_date.asc(), tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn search_by_title(
        &self,
        project_id: Option<ProjectId>,
        fragment: &str,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let pattern = contains_pattern(fragment);
        self.load_where(move |connection| {
            let mut query = tasks::table
                .select(TaskRow::as_select())
                .filter(tasks::title.ilike(pattern))
                .into_boxed();
            if let Some(project) = project_id {
                query = query.filter(tasks::project_id.eq(project.into_inner()));
            }
            query
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .load(connection)
        })
        .await
    }

    async fn count_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .count()
                .get_result::<i64>(connection)
                .map(count)
                .map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn count_by_status(
        &self,
        project_id: ProjectId,
    ) -> TaskRepositoryResult<BTreeMap<TaskStatus, u64>> {
        run_blocking(&self.pool, move |connection| {
            let rows = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .group_by(tasks::status)
                .select((tasks::status, diesel::dsl::count_star()))
                .load::<(String, i64)>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter()
                .map(|(status, total)| {
                    TaskStatus::parse(&status)
                        .map(|parsed| (parsed, count(total)))
                        .map_err(TaskRepositoryError::persistence)
                })
                .collect()
        })
        .await
    }

    async fn delete(&self, id: TaskId, marker: &HistoryEntry) -> TaskRepositoryResult<()> {
        let marker_row = to_history_row(marker);
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, TxError<TaskRepositoryError>, _>(|tx| {
                    let deleted = diesel::delete(tasks::table.find(id.into_inner())).execute(tx)?;
                    if deleted == 0 {
                        return Err(TxError::Rejected(TaskRepositoryError::NotFound(id)));
                    }
                    insert_effects(tx, std::slice::from_ref(&marker_row), &[])?;
                    Ok(())
                })
                .map_err(TxError::resolve)
        })
        .await
    }
}

fn effect_rows(effects: &TaskEffects) -> (Vec<NewHistoryRow>, Vec<NewNotificationRow>) {
    (
        effects.history.iter().map(to_history_row).collect(),
        effects
            .notifications
            .iter()
            .map(to_notification_row)
            .collect(),
    )
}

fn to_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        project_id: task.project_id().into_inner(),
        assignee_id: task.assignee_id().map(UserId::into_inner),
        creator_id: task.creator_id().into_inner(),
        due_date: task.due_date(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        status,
        priority,
        project_id,
        assignee_id,
        creator_id,
        due_date,
        created_at,
        updated_at,
    } = row;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        title: TaskTitle::new(title).map_err(TaskRepositoryError::persistence)?,
        description,
        status: TaskStatus::parse(&status).map_err(TaskRepositoryError::persistence)?,
        priority: TaskPriority::try_from(priority.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        project_id: ProjectId::from_uuid(project_id),
        assignee_id: assignee_id.map(UserId::from_uuid),
        creator_id: UserId::from_uuid(creator_id),
        due_date,
        created_at,
        updated_at,
    }))
}
