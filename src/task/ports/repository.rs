//! Repository port for task persistence and lookup.

use crate::history::domain::{HistoryEntry, HistoryEntryId};
use crate::notification::domain::{Notification, NotificationId};
use crate::project::domain::ProjectId;
use crate::task::domain::{Task, TaskId, TaskStatus};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// History entries and notifications written together with a task change.
///
/// History entries are appended in order.
#[derive(Debug, Clone, Default)]
pub struct TaskEffects {
    /// Ledger entries describing the change.
    pub history: Vec<HistoryEntry>,
    /// Notices raised by the change.
    pub notifications: Vec<Notification>,
}

impl TaskEffects {
    /// Creates an empty set of effects.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            history: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

/// Task persistence contract.
///
/// Write operations apply the task row and its [`TaskEffects`] atomically:
/// either all of them are persisted or none is. List operations return
/// tasks ordered by creation time.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task together with its effects.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists, or a duplicate-record error when an effect's identifier is
    /// already taken.
    async fn create(&self, task: &Task, effects: &TaskEffects) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task together with their effects.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task, effects: &TaskEffects) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the tasks of a project.
    async fn list_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks assigned to a user.
    async fn list_by_assignee(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks created by a user.
    async fn list_by_creator(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks of a project in the given status.
    async fn list_by_project_and_status(
        &self,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns open tasks due before `today`, optionally limited to one
    /// assignee.
    async fn list_overdue(
        &self,
        today: NaiveDate,
        assignee: Option<UserId>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns open tasks due within `from..=to`.
    async fn list_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns tasks whose title contains `fragment`, ignoring case,
    /// optionally limited to one project.
    async fn search_by_title(
        &self,
        project_id: Option<ProjectId>,
        fragment: &str,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Counts the tasks of a project.
    async fn count_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<u64>;

    /// Counts the tasks of a project per status. Statuses without tasks are
    /// absent from the map.
    async fn count_by_status(
        &self,
        project_id: ProjectId,
    ) -> TaskRepositoryResult<BTreeMap<TaskStatus, u64>>;

    /// Deletes a task together with its history entries and appends the
    /// project-level `marker` in the same write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId, marker: &HistoryEntry) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A history entry with the same identifier already exists.
    #[error("duplicate history entry identifier: {0}")]
    DuplicateHistoryEntry(HistoryEntryId),

    /// A notification with the same identifier already exists.
    #[error("duplicate notification identifier: {0}")]
    DuplicateNotification(NotificationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
