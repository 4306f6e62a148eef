//! Service layer for recording and querying task history.

use crate::error::ErrorKind;
use crate::history::{
    domain::{HistoryAction, HistoryDomainError, HistoryEntry, HistoryEntryId, NewHistoryEntry},
    ports::{HistoryRepository, HistoryRepositoryError},
};
use crate::project::domain::ProjectId;
use crate::store::Store;
use crate::task::{
    domain::TaskId,
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

/// Request payload for recording a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHistoryRequest {
    action: String,
    task_id: Option<TaskId>,
    user_id: Option<UserId>,
    old_value: Option<String>,
    new_value: Option<String>,
}

impl RecordHistoryRequest {
    /// Creates a request for the named action.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            task_id: None,
            user_id: None,
            old_value: None,
            new_value: None,
        }
    }

    /// Sets the task the entry describes.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub const fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the value before the change.
    #[must_use]
    pub fn with_old_value(mut self, value: impl Into<String>) -> Self {
        self.old_value = Some(value.into());
        self
    }

    /// Sets the value after the change.
    #[must_use]
    pub fn with_new_value(mut self, value: impl Into<String>) -> Self {
        self.new_value = Some(value.into());
        self
    }
}

/// Service-level errors for history operations.
#[derive(Debug, Error)]
pub enum HistoryServiceError {
    /// The action name could not be parsed.
    #[error(transparent)]
    Domain(#[from] HistoryDomainError),
    /// History repository operation failed.
    #[error(transparent)]
    Repository(#[from] HistoryRepositoryError),
    /// Task lookup failed.
    #[error(transparent)]
    Tasks(#[from] TaskRepositoryError),
    /// User lookup failed.
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
}

impl HistoryServiceError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::ValidationFailed,
            Self::TaskNotFound(_)
            | Self::UserNotFound(_)
            | Self::Repository(HistoryRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(HistoryRepositoryError::DuplicateEntry(_)) => ErrorKind::AlreadyExists,
            Self::Repository(_) | Self::Tasks(_) | Self::Users(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for history service operations.
pub type HistoryServiceResult<T> = Result<T, HistoryServiceError>;

/// History ledger service.
#[derive(Clone)]
pub struct HistoryLedgerService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> HistoryLedgerService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    /// Creates a new history ledger service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Records an entry after resolving the referenced task and user.
    ///
    /// The project reference is copied from the resolved task.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Domain`] for an unknown action name,
    /// or [`HistoryServiceError::TaskNotFound`] /
    /// [`HistoryServiceError::UserNotFound`] when a given reference does not
    /// resolve.
    pub async fn record(&self, request: RecordHistoryRequest) -> HistoryServiceResult<HistoryEntry> {
        let RecordHistoryRequest {
            action: action_name,
            task_id,
            user_id,
            old_value,
            new_value,
        } = request;
        let action = HistoryAction::parse(&action_name)?;

        let project_id = match task_id {
            Some(id) => Some(
                self.store
                    .tasks()
                    .find_by_id(id)
                    .await?
                    .ok_or(HistoryServiceError::TaskNotFound(id))?
                    .project_id(),
            ),
            None => None,
        };
        if let Some(id) = user_id
            && self.store.users().find_by_id(id).await?.is_none()
        {
            return Err(HistoryServiceError::UserNotFound(id));
        }

        let entry = HistoryEntry::new(
            NewHistoryEntry {
                task_id,
                project_id,
                user_id,
                action,
                old_value,
                new_value,
            },
            &*self.clock,
        );
        self.store.history().append(&entry).await?;
        info!(entry_id = %entry.id(), %action, "recorded history entry");
        Ok(entry)
    }

    /// Retrieves an entry by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryRepositoryError::NotFound`] (wrapped) when the entry
    /// does not exist.
    pub async fn by_id(&self, id: HistoryEntryId) -> HistoryServiceResult<HistoryEntry> {
        self.store
            .history()
            .find_by_id(id)
            .await?
            .ok_or(HistoryServiceError::Repository(HistoryRepositoryError::NotFound(id)))
    }

    /// Returns the entries of a task in recording order.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Repository`] when the lookup fails.
    pub async fn by_task(&self, task_id: TaskId) -> HistoryServiceResult<Vec<HistoryEntry>> {
        debug!(%task_id, "listing task history");
        Ok(self.store.history().list_by_task(task_id).await?)
    }

    /// Returns the entries recorded for a project's tasks, deletion markers
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Repository`] when the lookup fails.
    pub async fn by_project(&self, project_id: ProjectId) -> HistoryServiceResult<Vec<HistoryEntry>> {
        debug!(%project_id, "listing project history");
        Ok(self.store.history().list_by_project(project_id).await?)
    }

    /// Returns the entries recorded by a user.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Repository`] when the lookup fails.
    pub async fn by_user(&self, user_id: UserId) -> HistoryServiceResult<Vec<HistoryEntry>> {
        Ok(self.store.history().list_by_user(user_id).await?)
    }

    /// Returns the entries with the named action.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Domain`] for an unknown action name.
    pub async fn by_action(&self, action_name: &str) -> HistoryServiceResult<Vec<HistoryEntry>> {
        let action = HistoryAction::parse(action_name)?;
        Ok(self.store.history().list_by_action(action).await?)
    }

    /// Returns the entries of a task with the named action.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Domain`] for an unknown action name.
    pub async fn by_task_and_action(
        &self,
        task_id: TaskId,
        action_name: &str,
    ) -> HistoryServiceResult<Vec<HistoryEntry>> {
        let action = HistoryAction::parse(action_name)?;
        Ok(self
            .store
            .history()
            .list_by_task_and_action(task_id, action)
            .await?)
    }

    /// Returns every entry of a task, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Repository`] when the lookup fails.
    pub async fn recent_by_task(&self, task_id: TaskId) -> HistoryServiceResult<Vec<HistoryEntry>> {
        Ok(self.store.history().list_recent_by_task(task_id, None).await?)
    }

    /// Returns at most `limit` entries of a task, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Repository`] when the lookup fails.
    pub async fn recent_by_task_limited(
        &self,
        task_id: TaskId,
        limit: usize,
    ) -> HistoryServiceResult<Vec<HistoryEntry>> {
        Ok(self
            .store
            .history()
            .list_recent_by_task(task_id, Some(limit))
            .await?)
    }

    /// Deletes one entry.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryRepositoryError::NotFound`] (wrapped) when the entry
    /// does not exist.
    pub async fn delete(&self, id: HistoryEntryId) -> HistoryServiceResult<()> {
        self.store.history().delete(id).await?;
        info!(entry_id = %id, "deleted history entry");
        Ok(())
    }

    /// Deletes every entry of a task and returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryServiceError::Repository`] when the deletion fails.
    pub async fn delete_by_task(&self, task_id: TaskId) -> HistoryServiceResult<u64> {
        let removed = self.store.history().delete_by_task(task_id).await?;
        info!(%task_id, removed, "deleted task history");
        Ok(removed)
    }
}
