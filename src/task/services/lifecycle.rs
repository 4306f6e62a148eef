//! Service layer for the task lifecycle.
//!
//! Every mutation follows the same sequence: resolve the task and the
//! referenced users, authorize the actor against the project, apply the
//! change to the aggregate, then hand the task to the repository together
//! with the history entries and notifications the change implies. The
//! repository writes all of them or none.

use crate::error::ErrorKind;
use crate::history::domain::{HistoryAction, HistoryEntry, NewHistoryEntry};
use crate::membership::{
    domain::{Actor, ProjectAction},
    services::{AccessError, authorize},
};
use crate::notification::domain::Notification;
use crate::patch::FieldUpdate;
use crate::project::{
    domain::ProjectId,
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::store::Store;
use crate::task::{
    domain::{
        NewTaskData, Task, TaskChange, TaskDomainError, TaskId, TaskPatch, TaskPriority,
        TaskStatus, TaskTitle,
    },
    ports::{TaskEffects, TaskRepository, TaskRepositoryError},
};
use crate::user::{
    domain::UserId,
    ports::{UserRepository, UserRepositoryError},
};
use chrono::{Days, NaiveDate};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    project_id: ProjectId,
    title: String,
    description: Option<String>,
    priority: Option<TaskPriority>,
    due_date: Option<NaiveDate>,
    assignee_id: Option<UserId>,
    creator_id: Option<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: None,
            priority: None,
            due_date: None,
            assignee_id: None,
            creator_id: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority. Defaults to `MEDIUM`.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the initial assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Records `creator_id` as the creator instead of the acting user.
    #[must_use]
    pub const fn with_creator(mut self, creator_id: UserId) -> Self {
        self.creator_id = Some(creator_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StatusValue {
    Typed(TaskStatus),
    Named(String),
}

/// Request payload for patching a task. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    title: Option<String>,
    description: FieldUpdate<String>,
    status: Option<StatusValue>,
    priority: Option<TaskPriority>,
    due_date: FieldUpdate<NaiveDate>,
    assignee: FieldUpdate<UserId>,
}

impl UpdateTaskRequest {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets, clears or keeps the description.
    #[must_use]
    pub fn with_description(mut self, description: FieldUpdate<String>) -> Self {
        self.description = description;
        self
    }

    /// Replaces the status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(StatusValue::Typed(status));
        self
    }

    /// Replaces the status by canonical name, validated when applied.
    #[must_use]
    pub fn with_status_name(mut self, status: impl Into<String>) -> Self {
        self.status = Some(StatusValue::Named(status.into()));
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets, clears or keeps the due date.
    #[must_use]
    pub fn with_due_date(mut self, due_date: FieldUpdate<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Sets, clears or keeps the assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee: FieldUpdate<UserId>) -> Self {
        self.assignee = assignee;
        self
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Task repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The actor may not perform the operation.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// Project lookup failed.
    #[error(transparent)]
    Projects(#[from] ProjectRepositoryError),
    /// User lookup failed.
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// A referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// A system actor created a task without naming its creator.
    #[error("a task created by the system must name its creator")]
    MissingCreator,
}

impl TaskLifecycleError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::MissingCreator => ErrorKind::ValidationFailed,
            Self::ProjectNotFound(_)
            | Self::UserNotFound(_)
            | Self::Repository(TaskRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(TaskRepositoryError::DuplicateTask(_)) => ErrorKind::AlreadyExists,
            Self::Access(err) => err.kind(),
            Self::Repository(_) | Self::Projects(_) | Self::Users(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> TaskLifecycleService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a `TODO` task in a project.
    ///
    /// Records `CREATED` and notifies the assignee when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the title is invalid, the project,
    /// creator or assignee does not exist, the actor lacks
    /// [`ProjectAction::CreateTask`], or a system actor names no creator.
    pub async fn create_task(
        &self,
        actor: Actor,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let CreateTaskRequest {
            project_id,
            title: raw_title,
            description,
            priority,
            due_date,
            assignee_id,
            creator_id: explicit_creator,
        } = request;
        let title = TaskTitle::new(raw_title)?;

        if self.store.projects().find_by_id(project_id).await?.is_none() {
            return Err(TaskLifecycleError::ProjectNotFound(project_id));
        }
        authorize(self.store.members(), project_id, actor, ProjectAction::CreateTask).await?;

        let creator_id = explicit_creator
            .or_else(|| actor.user_id())
            .ok_or(TaskLifecycleError::MissingCreator)?;
        self.require_user(creator_id).await?;
        if let Some(assignee) = assignee_id {
            self.require_user(assignee).await?;
        }

        let task = Task::new(
            NewTaskData {
                title,
                description,
                project_id,
                priority: priority.unwrap_or_default(),
                due_date,
                assignee_id,
                creator_id,
            },
            &*self.clock,
        );
        let mut effects = TaskEffects::new();
        effects.history.push(self.history_entry(
            actor,
            &task,
            HistoryAction::Created,
            None,
            Some(task.title().to_string()),
        ));
        if let Some(assignee) = assignee_id {
            effects
                .notifications
                .push(Notification::task_assigned(assignee, &task, &*self.clock));
        }
        self.store.tasks().create(&task, &effects).await?;
        log_emitted(&effects.notifications);

        info!(task_id = %task.id(), %project_id, %actor, "created task");
        Ok(task)
    }

    /// Applies a partial update to a task.
    ///
    /// One history entry is recorded per changed field. An empty or no-op
    /// patch refreshes `updated_at` and records nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task or a new assignee does
    /// not exist, a value is invalid (including unknown status names), or
    /// the actor lacks [`ProjectAction::EditTask`].
    pub async fn update_task(
        &self,
        actor: Actor,
        task_id: TaskId,
        request: UpdateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.require_task(task_id).await?;
        authorize(
            self.store.members(),
            task.project_id(),
            actor,
            ProjectAction::EditTask,
        )
        .await?;

        let patch = self.build_patch(request).await?;
        let changes = task.apply(patch, &*self.clock);
        let mut effects = TaskEffects::new();
        for change in &changes {
            effects
                .history
                .push(self.change_entry(actor, &task, change).await?);
        }
        effects.notifications = self.change_notices(actor, &task, &changes);
        self.store.tasks().update(&task, &effects).await?;
        log_emitted(&effects.notifications);

        info!(%task_id, changed = changes.len(), %actor, "updated task");
        Ok(task)
    }

    /// Assigns a task to a user, replacing any current assignee.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task or user does not exist or
    /// the actor lacks [`ProjectAction::EditTask`].
    pub async fn assign_task(
        &self,
        actor: Actor,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.require_task(task_id).await?;
        authorize(
            self.store.members(),
            task.project_id(),
            actor,
            ProjectAction::EditTask,
        )
        .await?;
        self.require_user(user_id).await?;

        let change = task.assign(user_id, &*self.clock);
        let effects = TaskEffects {
            history: vec![self.change_entry(actor, &task, &change).await?],
            notifications: vec![Notification::task_assigned(user_id, &task, &*self.clock)],
        };
        self.store.tasks().update(&task, &effects).await?;
        log_emitted(&effects.notifications);

        info!(%task_id, assignee_id = %user_id, %actor, "assigned task");
        Ok(task)
    }

    /// Sets a task's status.
    ///
    /// The assignee is notified unless they made the change themselves.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task does not exist or the
    /// actor lacks [`ProjectAction::EditTask`].
    pub async fn update_status(
        &self,
        actor: Actor,
        task_id: TaskId,
        status: TaskStatus,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.require_task(task_id).await?;
        authorize(
            self.store.members(),
            task.project_id(),
            actor,
            ProjectAction::EditTask,
        )
        .await?;

        let change = task.set_status(status, &*self.clock);
        let effects = TaskEffects {
            history: vec![self.change_entry(actor, &task, &change).await?],
            notifications: self.change_notices(actor, &task, std::slice::from_ref(&change)),
        };
        self.store.tasks().update(&task, &effects).await?;
        log_emitted(&effects.notifications);

        info!(%task_id, %status, %actor, "updated task status");
        Ok(task)
    }

    /// Sets a task's status from its canonical name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownStatus`] (wrapped) for names outside
    /// the status set, otherwise as [`Self::update_status`].
    pub async fn update_status_by_name(
        &self,
        actor: Actor,
        task_id: TaskId,
        status_name: &str,
    ) -> TaskLifecycleResult<Task> {
        let status = TaskStatus::parse(status_name)?;
        self.update_status(actor, task_id, status).await
    }

    /// Deletes a task and its history, leaving a `DELETED` marker in the
    /// project's audit trail.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task does not exist or the
    /// actor lacks [`ProjectAction::DeleteTask`].
    pub async fn delete_task(&self, actor: Actor, task_id: TaskId) -> TaskLifecycleResult<()> {
        let task = self.require_task(task_id).await?;
        authorize(
            self.store.members(),
            task.project_id(),
            actor,
            ProjectAction::DeleteTask,
        )
        .await?;

        let marker = HistoryEntry::new(
            NewHistoryEntry {
                task_id: None,
                project_id: Some(task.project_id()),
                user_id: actor.user_id(),
                action: HistoryAction::Deleted,
                old_value: Some(task.title().to_string()),
                new_value: None,
            },
            &*self.clock,
        );
        self.store.tasks().delete(task_id, &marker).await?;

        info!(%task_id, project_id = %task.project_id(), %actor, "deleted task");
        Ok(())
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] (wrapped) when the task does
    /// not exist.
    pub async fn get_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.require_task(task_id).await
    }

    /// Returns the tasks of a project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_by_project(&self, project_id: ProjectId) -> TaskLifecycleResult<Vec<Task>> {
        debug!(%project_id, "listing project tasks");
        Ok(self.store.tasks().list_by_project(project_id).await?)
    }

    /// Returns the tasks assigned to a user.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_by_assignee(&self, user_id: UserId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.store.tasks().list_by_assignee(user_id).await?)
    }

    /// Returns the tasks created by a user.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_by_creator(&self, user_id: UserId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.store.tasks().list_by_creator(user_id).await?)
    }

    /// Returns the tasks of a project in the given status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_by_status(
        &self,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self
            .store
            .tasks()
            .list_by_project_and_status(project_id, status)
            .await?)
    }

    /// Returns open tasks whose due date is before `today`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_overdue(&self, today: NaiveDate) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.store.tasks().list_overdue(today, None).await?)
    }

    /// Returns a user's open tasks whose due date is before `today`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_overdue_for_user(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.store.tasks().list_overdue(today, Some(user_id)).await?)
    }

    /// Returns open tasks due between `today` and `today + days`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_due_soon(&self, today: NaiveDate, days: u32) -> TaskLifecycleResult<Vec<Task>> {
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        Ok(self.store.tasks().list_due_between(today, until).await?)
    }

    /// Returns tasks whose title contains `fragment`, ignoring case,
    /// optionally limited to one project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn search_by_title(
        &self,
        project_id: Option<ProjectId>,
        fragment: &str,
    ) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self
            .store
            .tasks()
            .search_by_title(project_id, fragment.trim())
            .await?)
    }

    async fn build_patch(&self, request: UpdateTaskRequest) -> TaskLifecycleResult<TaskPatch> {
        let UpdateTaskRequest {
            title: raw_title,
            description,
            status: status_value,
            priority,
            due_date,
            assignee,
        } = request;

        let title = raw_title.map(TaskTitle::new).transpose()?;
        let status = match status_value {
            Some(StatusValue::Typed(status)) => Some(status),
            Some(StatusValue::Named(name)) => Some(TaskStatus::parse(&name)?),
            None => None,
        };
        if let FieldUpdate::Set(assignee_id) = &assignee {
            self.require_user(*assignee_id).await?;
        }

        Ok(TaskPatch {
            title,
            description,
            status,
            priority,
            due_date,
            assignee,
        })
    }

    async fn require_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.store
            .tasks()
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::Repository(TaskRepositoryError::NotFound(task_id)))
    }

    async fn require_user(&self, user_id: UserId) -> TaskLifecycleResult<()> {
        self.store
            .users()
            .find_by_id(user_id)
            .await?
            .map(drop)
            .ok_or(TaskLifecycleError::UserNotFound(user_id))
    }

    /// Renders a user reference for history, preferring the username.
    async fn display_user(&self, user_id: Option<UserId>) -> TaskLifecycleResult<Option<String>> {
        let Some(id) = user_id else {
            return Ok(None);
        };
        let user = self.store.users().find_by_id(id).await?;
        Ok(Some(user.map_or_else(
            || id.to_string(),
            |found| found.username().to_string(),
        )))
    }

    async fn change_entry(
        &self,
        actor: Actor,
        task: &Task,
        change: &TaskChange,
    ) -> TaskLifecycleResult<HistoryEntry> {
        let (old_value, new_value) = match change {
            TaskChange::Title { old, new } => (Some(old.to_string()), Some(new.to_string())),
            TaskChange::Description { old, new } => (old.clone(), new.clone()),
            TaskChange::Status { old, new } => (Some(old.to_string()), Some(new.to_string())),
            TaskChange::Priority { old, new } => (Some(old.to_string()), Some(new.to_string())),
            TaskChange::DueDate { old, new } => (
                old.map(|date| date.to_string()),
                new.map(|date| date.to_string()),
            ),
            TaskChange::Assignee { old, new } => {
                (self.display_user(*old).await?, self.display_user(*new).await?)
            }
        };
        Ok(self.history_entry(
            actor,
            task,
            HistoryAction::for_change(change),
            old_value,
            new_value,
        ))
    }

    fn history_entry(
        &self,
        actor: Actor,
        task: &Task,
        action: HistoryAction,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> HistoryEntry {
        HistoryEntry::new(
            NewHistoryEntry {
                task_id: Some(task.id()),
                project_id: Some(task.project_id()),
                user_id: actor.user_id(),
                action,
                old_value,
                new_value,
            },
            &*self.clock,
        )
    }

    /// Builds the notifications implied by a set of changes.
    ///
    /// A new assignee receives `TASK_ASSIGNED`; a status change notifies the
    /// current assignee unless they are the actor.
    fn change_notices(
        &self,
        actor: Actor,
        task: &Task,
        changes: &[TaskChange],
    ) -> Vec<Notification> {
        changes
            .iter()
            .filter_map(|change| match change {
                TaskChange::Assignee {
                    new: Some(assignee_id),
                    ..
                } => Some(Notification::task_assigned(*assignee_id, task, &*self.clock)),
                TaskChange::Status { new, .. } => task
                    .assignee_id()
                    .filter(|assignee_id| actor.user_id() != Some(*assignee_id))
                    .map(|assignee_id| {
                        Notification::task_status_changed(assignee_id, task, *new, &*self.clock)
                    }),
                _ => None,
            })
            .collect()
    }
}

fn log_emitted(notifications: &[Notification]) {
    for notification in notifications {
        debug!(
            notification_id = %notification.id(),
            user_id = %notification.user_id(),
            notification_type = %notification.notification_type(),
            "emitted notification"
        );
    }
}
