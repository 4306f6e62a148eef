//! Task aggregate root.

use super::{TaskChange, TaskDomainError, TaskId, TaskPriority, TaskStatus};
use crate::patch::FieldUpdate;
use crate::project::domain::ProjectId;
use crate::user::domain::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TITLE_LENGTH: usize = 200;

/// Validated task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for blank input or
    /// [`TaskDomainError::TitleTooLong`] above 200 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let length = trimmed.chars().count();
        if length > MAX_TITLE_LENGTH {
            return Err(TaskDomainError::TitleTooLong(length));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    project_id: ProjectId,
    assignee_id: Option<UserId>,
    creator_id: UserId,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Task title.
    pub title: TaskTitle,
    /// Optional description.
    pub description: Option<String>,
    /// Owning project.
    pub project_id: ProjectId,
    /// Initial priority.
    pub priority: TaskPriority,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Optional initial assignee.
    pub assignee_id: Option<UserId>,
    /// User recorded as the task's creator.
    pub creator_id: UserId,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted project reference.
    pub project_id: ProjectId,
    /// Persisted assignee reference.
    pub assignee_id: Option<UserId>,
    /// Persisted creator reference.
    pub creator_id: UserId,
    /// Persisted due date.
    pub due_date: Option<NaiveDate>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Independently optional field changes for an existing task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<TaskTitle>,
    /// Description update.
    pub description: FieldUpdate<String>,
    /// Replacement status.
    pub status: Option<TaskStatus>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
    /// Due date update.
    pub due_date: FieldUpdate<NaiveDate>,
    /// Assignee update.
    pub assignee: FieldUpdate<UserId>,
}

impl Task {
    /// Creates a new `TODO` task.
    #[must_use]
    pub fn new(data: NewTaskData, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: data.title,
            description: data.description,
            status: TaskStatus::Todo,
            priority: data.priority,
            project_id: data.project_id,
            assignee_id: data.assignee_id,
            creator_id: data.creator_id,
            due_date: data.due_date,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            project_id: data.project_id,
            assignee_id: data.assignee_id,
            creator_id: data.creator_id,
            due_date: data.due_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee_id(&self) -> Option<UserId> {
        self.assignee_id
    }

    /// Returns the creator.
    #[must_use]
    pub const fn creator_id(&self) -> UserId {
        self.creator_id
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the task is open and its due date is before
    /// `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < today)
    }

    /// Applies a patch and returns the fields that actually changed.
    ///
    /// The update timestamp is refreshed even when nothing changed.
    pub fn apply(&mut self, patch: TaskPatch, clock: &impl Clock) -> Vec<TaskChange> {
        let mut changes = Vec::new();

        if let Some(title) = patch.title
            && title != self.title
        {
            let old = std::mem::replace(&mut self.title, title.clone());
            changes.push(TaskChange::Title { old, new: title });
        }

        let description = patch.description.apply_to(self.description.clone());
        if description != self.description {
            let old = std::mem::replace(&mut self.description, description.clone());
            changes.push(TaskChange::Description {
                old,
                new: description,
            });
        }

        if let Some(status) = patch.status
            && status != self.status
        {
            changes.push(TaskChange::Status {
                old: self.status,
                new: status,
            });
            self.status = status;
        }

        if let Some(priority) = patch.priority
            && priority != self.priority
        {
            changes.push(TaskChange::Priority {
                old: self.priority,
                new: priority,
            });
            self.priority = priority;
        }

        let due_date = patch.due_date.apply_to(self.due_date);
        if due_date != self.due_date {
            changes.push(TaskChange::DueDate {
                old: self.due_date,
                new: due_date,
            });
            self.due_date = due_date;
        }

        let assignee_id = patch.assignee.apply_to(self.assignee_id);
        if assignee_id != self.assignee_id {
            changes.push(TaskChange::Assignee {
                old: self.assignee_id,
                new: assignee_id,
            });
            self.assignee_id = assignee_id;
        }

        self.touch(clock);
        changes
    }

    /// Assigns the task to `user_id`, replacing any current assignee.
    pub fn assign(&mut self, user_id: UserId, clock: &impl Clock) -> TaskChange {
        let old = self.assignee_id.replace(user_id);
        self.touch(clock);
        TaskChange::Assignee {
            old,
            new: Some(user_id),
        }
    }

    /// Sets the workflow status. Any status may follow any other.
    pub fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) -> TaskChange {
        let old = std::mem::replace(&mut self.status, status);
        self.touch(clock);
        TaskChange::Status { old, new: status }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
