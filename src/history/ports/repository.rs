//! Repository port for the history ledger.

use crate::history::domain::{HistoryAction, HistoryEntry, HistoryEntryId};
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for history repository operations.
pub type HistoryRepositoryResult<T> = Result<T, HistoryRepositoryError>;

/// Append-only history persistence contract.
///
/// Unless stated otherwise, lists are returned in recording order.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryRepositoryError::DuplicateEntry`] when the identifier
    /// already exists.
    async fn append(&self, entry: &HistoryEntry) -> HistoryRepositoryResult<()>;

    /// Finds an entry by identifier.
    async fn find_by_id(&self, id: HistoryEntryId) -> HistoryRepositoryResult<Option<HistoryEntry>>;

    /// Returns the entries of a task.
    async fn list_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<Vec<HistoryEntry>>;

    /// Returns the entries recorded for tasks of a project, including
    /// deletion markers.
    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>>;

    /// Returns the entries recorded by a user.
    async fn list_by_user(&self, user_id: UserId) -> HistoryRepositoryResult<Vec<HistoryEntry>>;

    /// Returns the entries with the given action.
    async fn list_by_action(
        &self,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>>;

    /// Returns the entries of a task with the given action.
    async fn list_by_task_and_action(
        &self,
        task_id: TaskId,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>>;

    /// Returns the entries of a task newest first, bounded by `limit` when
    /// given.
    async fn list_recent_by_task(
        &self,
        task_id: TaskId,
        limit: Option<usize>,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>>;

    /// Deletes one entry.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryRepositoryError::NotFound`] when the entry does not
    /// exist.
    async fn delete(&self, id: HistoryEntryId) -> HistoryRepositoryResult<()>;

    /// Deletes every entry of a task and returns how many were removed.
    async fn delete_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<u64>;
}

/// Errors returned by history repository implementations.
#[derive(Debug, Clone, Error)]
pub enum HistoryRepositoryError {
    /// An entry with the same identifier already exists.
    #[error("duplicate history entry identifier: {0}")]
    DuplicateEntry(HistoryEntryId),

    /// The entry was not found.
    #[error("history entry not found: {0}")]
    NotFound(HistoryEntryId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl HistoryRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
