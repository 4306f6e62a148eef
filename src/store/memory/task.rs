//! In-memory task repository.

use super::{SharedState, TakenEffect, count, read_state, sort_by_creation, write_state};
use crate::history::domain::HistoryEntry;
use crate::project::domain::ProjectId;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::{TaskEffects, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Task repository over the shared in-memory state.
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    state: SharedState,
}

impl InMemoryTaskRepository {
    pub(super) const fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn collect_where(&self, predicate: impl Fn(&Task) -> bool) -> TaskRepositoryResult<Vec<Task>> {
        let state = read_state(&self.state, TaskRepositoryError::persistence)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| predicate(task))
            .cloned()
            .collect();
        sort_by_creation(&mut tasks, Task::created_at, Task::id);
        Ok(tasks)
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task, effects: &TaskEffects) -> TaskRepositoryResult<()> {
        let mut state = write_state(&self.state, TaskRepositoryError::persistence)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        if let Some(taken) = state.find_taken_effect(&effects.history, &effects.notifications) {
            return Err(rejection(taken));
        }
        state.tasks.insert(task.id(), task.clone());
        state.push_effects(&effects.history, &effects.notifications);
        Ok(())
    }

    async fn update(&self, task: &Task, effects: &TaskEffects) -> TaskRepositoryResult<()> {
        let mut state = write_state(&self.state, TaskRepositoryError::persistence)?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        if let Some(taken) = state.find_taken_effect(&effects.history, &effects.notifications) {
            return Err(rejection(taken));
        }
        state.tasks.insert(task.id(), task.clone());
        state.push_effects(&effects.history, &effects.notifications);
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = read_state(&self.state, TaskRepositoryError::persistence)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_where(|task| task.project_id() == project_id)
    }

    async fn list_by_assignee(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_where(|task| task.assignee_id() == Some(user_id))
    }

    async fn list_by_creator(&self, user_id: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_where(|task| task.creator_id() == user_id)
    }

    async fn list_by_project_and_status(
        &self,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_where(|task| task.project_id() == project_id && task.status() == status)
    }

    async fn list_overdue(
        &self,
        today: NaiveDate,
        assignee: Option<UserId>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let mut tasks = self.collect_where(|task| {
            task.is_overdue(today) && assignee.is_none_or(|user| task.assignee_id() == Some(user))
        })?;
        tasks.sort_by_key(Task::due_date);
        Ok(tasks)
    }

    async fn list_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let mut tasks = self.collect_where(|task| {
            task.status().is_open()
                && task
                    .due_date()
                    .is_some_and(|due| (from..=to).contains(&due))
        })?;
        tasks.sort_by_key(Task::due_date);
        Ok(tasks)
    }

    async fn search_by_title(
        &self,
        project_id: Option<ProjectId>,
        fragment: &str,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let needle = fragment.to_lowercase();
        self.collect_where(|task| {
            project_id.is_none_or(|project| task.project_id() == project)
                && task.title().as_str().to_lowercase().contains(&needle)
        })
    }

    async fn count_by_project(&self, project_id: ProjectId) -> TaskRepositoryResult<u64> {
        let state = read_state(&self.state, TaskRepositoryError::persistence)?;
        Ok(count(
            state
                .tasks
                .values()
                .filter(|task| task.project_id() == project_id)
                .count(),
        ))
    }

    async fn count_by_status(
        &self,
        project_id: ProjectId,
    ) -> TaskRepositoryResult<BTreeMap<TaskStatus, u64>> {
        let state = read_state(&self.state, TaskRepositoryError::persistence)?;
        let mut counts = BTreeMap::new();
        for task in state
            .tasks
            .values()
            .filter(|task| task.project_id() == project_id)
        {
            *counts.entry(task.status()).or_insert(0_u64) += 1;
        }
        Ok(counts)
    }

    async fn delete(&self, id: TaskId, marker: &HistoryEntry) -> TaskRepositoryResult<()> {
        let mut state = write_state(&self.state, TaskRepositoryError::persistence)?;
        if !state.tasks.contains_key(&id) {
            return Err(TaskRepositoryError::NotFound(id));
        }
        let markers = std::slice::from_ref(marker);
        if let Some(taken) = state.find_taken_effect(markers, &[]) {
            return Err(rejection(taken));
        }
        state.remove_tasks_where(|task| task.id() == id);
        state.push_effects(markers, &[]);
        Ok(())
    }
}

const fn rejection(taken: TakenEffect) -> TaskRepositoryError {
    match taken {
        TakenEffect::History(id) => TaskRepositoryError::DuplicateHistoryEntry(id),
        TakenEffect::Notification(id) => TaskRepositoryError::DuplicateNotification(id),
    }
}
