//! `PostgreSQL` history ledger.
//!
//! Ledger order is the `seq` column assigned on insert, so entries recorded
//! within the same clock tick keep their append order.

use super::{
    PgPool, affected,
    models::{HistoryRow, NewHistoryRow},
    run_blocking,
    schema::task_history,
};
use crate::history::{
    domain::{HistoryAction, HistoryEntry, HistoryEntryId, PersistedHistoryEntryData},
    ports::{HistoryRepository, HistoryRepositoryError, HistoryRepositoryResult},
};
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed history repository.
#[derive(Debug, Clone)]
pub struct PostgresHistoryRepository {
    pool: PgPool,
}

impl PostgresHistoryRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_where<F>(&self, query: F) -> HistoryRepositoryResult<Vec<HistoryEntry>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<HistoryRow>> + Send + 'static,
    {
        run_blocking(&self.pool, move |connection| {
            query(connection)
                .map_err(HistoryRepositoryError::persistence)?
                .into_iter()
                .map(row_to_entry)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl HistoryRepository for PostgresHistoryRepository {
    async fn append(&self, entry: &HistoryEntry) -> HistoryRepositoryResult<()> {
        let row = to_history_row(entry);
        let entry_id = entry.id();
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(task_history::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        HistoryRepositoryError::DuplicateEntry(entry_id)
                    }
                    _ => HistoryRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: HistoryEntryId) -> HistoryRepositoryResult<Option<HistoryEntry>> {
        run_blocking(&self.pool, move |connection| {
            task_history::table
                .find(id.into_inner())
                .select(HistoryRow::as_select())
                .first(connection)
                .optional()
                .map_err(HistoryRepositoryError::persistence)?
                .map(row_to_entry)
                .transpose()
        })
        .await
    }

    async fn list_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.load_where(move |connection| {
            task_history::table
                .filter(task_history::task_id.eq(task_id.into_inner()))
                .order(task_history::seq.asc())
                .select(HistoryRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.load_where(move |connection| {
            task_history::table
                .filter(task_history::project_id.eq(project_id.into_inner()))
                .order(task_history::seq.asc())
                .select(HistoryRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_user(&self, user_id: UserId) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.load_where(move |connection| {
            task_history::table
                .filter(task_history::user_id.eq(user_id.into_inner()))
                .order(task_history::seq.asc())
                .select(HistoryRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_action(
        &self,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.load_where(move |connection| {
            task_history::table
                .filter(task_history::action.eq(action.as_str()))
                .order(task_history::seq.asc())
                .select(HistoryRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_task_and_action(
        &self,
        task_id: TaskId,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.load_where(move |connection| {
            task_history::table
                .filter(task_history::task_id.eq(task_id.into_inner()))
                .filter(task_history::action.eq(action.as_str()))
                .order(task_history::seq.asc())
                .select(HistoryRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_recent_by_task(
        &self,
        task_id: TaskId,
        limit: Option<usize>,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        let row_limit = limit.map_or(i64::MAX, |max| i64::try_from(max).unwrap_or(i64::MAX));
        self.load_where(move |connection| {
            task_history::table
                .filter(task_history::task_id.eq(task_id.into_inner()))
                .order(task_history::seq.desc())
                .limit(row_limit)
                .select(HistoryRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn delete(&self, id: HistoryEntryId) -> HistoryRepositoryResult<()> {
        run_blocking(&self.pool, move |connection| {
            let deleted = diesel::delete(task_history::table.find(id.into_inner()))
                .execute(connection)
                .map_err(HistoryRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(HistoryRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<u64> {
        run_blocking(&self.pool, move |connection| {
            diesel::delete(
                task_history::table.filter(task_history::task_id.eq(task_id.into_inner())),
            )
            .execute(connection)
            .map(affected)
            .map_err(HistoryRepositoryError::persistence)
        })
        .await
    }
}

pub(super) fn to_history_row(entry: &HistoryEntry) -> NewHistoryRow {
    NewHistoryRow {
        id: entry.id().into_inner(),
        task_id: entry.task_id().map(TaskId::into_inner),
        project_id: entry.project_id().map(ProjectId::into_inner),
        user_id: entry.user_id().map(UserId::into_inner),
        action: entry.action().as_str().to_owned(),
        old_value: entry.old_value().map(str::to_owned),
        new_value: entry.new_value().map(str::to_owned),
        created_at: entry.created_at(),
    }
}

fn row_to_entry(row: HistoryRow) -> HistoryRepositoryResult<HistoryEntry> {
    let HistoryRow {
        id,
        task_id,
        project_id,
        user_id,
        action,
        old_value,
        new_value,
        created_at,
    } = row;
    Ok(HistoryEntry::from_persisted(PersistedHistoryEntryData {
        id: HistoryEntryId::from_uuid(id),
        task_id: task_id.map(TaskId::from_uuid),
        project_id: project_id.map(ProjectId::from_uuid),
        user_id: user_id.map(UserId::from_uuid),
        action: HistoryAction::parse(&action).map_err(HistoryRepositoryError::persistence)?,
        old_value,
        new_value,
        created_at,
    }))
}
