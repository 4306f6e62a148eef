//! In-memory history ledger.

use super::{SharedState, count, read_state, write_state};
use crate::history::{
    domain::{HistoryAction, HistoryEntry, HistoryEntryId},
    ports::{HistoryRepository, HistoryRepositoryError, HistoryRepositoryResult},
};
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use async_trait::async_trait;

/// Append-only history repository over the shared in-memory state.
///
/// Entries are kept in insertion order, which doubles as the ledger order.
#[derive(Debug, Clone)]
pub struct InMemoryHistoryRepository {
    state: SharedState,
}

impl InMemoryHistoryRepository {
    pub(super) const fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn collect_where(
        &self,
        predicate: impl Fn(&HistoryEntry) -> bool,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        let state = read_state(&self.state, HistoryRepositoryError::persistence)?;
        Ok(state
            .history
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, entry: &HistoryEntry) -> HistoryRepositoryResult<()> {
        let mut state = write_state(&self.state, HistoryRepositoryError::persistence)?;
        if state.history.iter().any(|existing| existing.id() == entry.id()) {
            return Err(HistoryRepositoryError::DuplicateEntry(entry.id()));
        }
        state.history.push(entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: HistoryEntryId) -> HistoryRepositoryResult<Option<HistoryEntry>> {
        let state = read_state(&self.state, HistoryRepositoryError::persistence)?;
        Ok(state.history.iter().find(|entry| entry.id() == id).cloned())
    }

    async fn list_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.collect_where(|entry| entry.task_id() == Some(task_id))
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.collect_where(|entry| entry.project_id() == Some(project_id))
    }

    async fn list_by_user(&self, user_id: UserId) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.collect_where(|entry| entry.user_id() == Some(user_id))
    }

    async fn list_by_action(
        &self,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.collect_where(|entry| entry.action() == action)
    }

    async fn list_by_task_and_action(
        &self,
        task_id: TaskId,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.collect_where(|entry| entry.task_id() == Some(task_id) && entry.action() == action)
    }

    async fn list_recent_by_task(
        &self,
        task_id: TaskId,
        limit: Option<usize>,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        let mut entries = self.collect_where(|entry| entry.task_id() == Some(task_id))?;
        entries.reverse();
        if let Some(max) = limit {
            entries.truncate(max);
        }
        Ok(entries)
    }

    async fn delete(&self, id: HistoryEntryId) -> HistoryRepositoryResult<()> {
        let mut state = write_state(&self.state, HistoryRepositoryError::persistence)?;
        let before = state.history.len();
        state.history.retain(|entry| entry.id() != id);
        if state.history.len() == before {
            return Err(HistoryRepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<u64> {
        let mut state = write_state(&self.state, HistoryRepositoryError::persistence)?;
        let before = state.history.len();
        state
            .history
            .retain(|entry| entry.task_id() != Some(task_id));
        Ok(count(before - state.history.len()))
    }
}
