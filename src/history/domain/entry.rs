//! Immutable task history entries.

use super::{HistoryAction, HistoryEntryId};
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One audit record. Entries are never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: HistoryEntryId,
    task_id: Option<TaskId>,
    project_id: Option<ProjectId>,
    user_id: Option<UserId>,
    action: HistoryAction,
    old_value: Option<String>,
    new_value: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for recording a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    /// Task the entry describes; `None` once the task is gone.
    pub task_id: Option<TaskId>,
    /// Project the task belonged to when the entry was recorded.
    pub project_id: Option<ProjectId>,
    /// Acting user; `None` for system actions.
    pub user_id: Option<UserId>,
    /// Recorded action.
    pub action: HistoryAction,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
}

/// Parameter object for reconstructing a persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedHistoryEntryData {
    /// Persisted entry identifier.
    pub id: HistoryEntryId,
    /// Persisted task reference.
    pub task_id: Option<TaskId>,
    /// Persisted project reference.
    pub project_id: Option<ProjectId>,
    /// Persisted acting user.
    pub user_id: Option<UserId>,
    /// Persisted action.
    pub action: HistoryAction,
    /// Persisted old value.
    pub old_value: Option<String>,
    /// Persisted new value.
    pub new_value: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Creates a history entry stamped with the current time.
    #[must_use]
    pub fn new(data: NewHistoryEntry, clock: &impl Clock) -> Self {
        Self {
            id: HistoryEntryId::new(),
            task_id: data.task_id,
            project_id: data.project_id,
            user_id: data.user_id,
            action: data.action,
            old_value: data.old_value,
            new_value: data.new_value,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs an entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedHistoryEntryData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            project_id: data.project_id,
            user_id: data.user_id,
            action: data.action,
            old_value: data.old_value,
            new_value: data.new_value,
            created_at: data.created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> HistoryEntryId {
        self.id
    }

    /// Returns the task reference, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the project reference, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the acting user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the recorded action.
    #[must_use]
    pub const fn action(&self) -> HistoryAction {
        self.action
    }

    /// Returns the value before the change.
    #[must_use]
    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    /// Returns the value after the change.
    #[must_use]
    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
