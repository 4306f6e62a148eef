//! Task writes land together with their history, independent of the
//! standalone history adapter.

use crate::history::{
    domain::{HistoryAction, HistoryEntry, HistoryEntryId},
    ports::{HistoryRepository, HistoryRepositoryError, HistoryRepositoryResult},
};
use crate::membership::domain::Actor;
use crate::project::domain::ProjectId;
use crate::store::{
    Store,
    memory::{
        InMemoryMembershipRepository, InMemoryNotificationRepository, InMemoryProjectRepository,
        InMemoryRoleCatalog, InMemoryStore, InMemoryTaskRepository, InMemoryUserRepository,
    },
};
use crate::task::{
    domain::{TaskId, TaskPriority},
    services::{TaskLifecycleService, UpdateTaskRequest},
};
use crate::test_support::{Harness, harness};
use crate::user::domain::UserId;
use async_trait::async_trait;
use rstest::rstest;
use std::io;
use std::sync::Arc;

/// History adapter that refuses standalone appends and reads through to the
/// shared in-memory state.
struct AppendRefusingHistory {
    inner: InMemoryStore,
}

#[async_trait]
impl HistoryRepository for AppendRefusingHistory {
    async fn append(&self, _entry: &HistoryEntry) -> HistoryRepositoryResult<()> {
        Err(HistoryRepositoryError::persistence(io::Error::other(
            "standalone appends are disabled",
        )))
    }

    async fn find_by_id(
        &self,
        id: HistoryEntryId,
    ) -> HistoryRepositoryResult<Option<HistoryEntry>> {
        self.inner.history().find_by_id(id).await
    }

    async fn list_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.inner.history().list_by_task(task_id).await
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.inner.history().list_by_project(project_id).await
    }

    async fn list_by_user(&self, user_id: UserId) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.inner.history().list_by_user(user_id).await
    }

    async fn list_by_action(
        &self,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.inner.history().list_by_action(action).await
    }

    async fn list_by_task_and_action(
        &self,
        task_id: TaskId,
        action: HistoryAction,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.inner
            .history()
            .list_by_task_and_action(task_id, action)
            .await
    }

    async fn list_recent_by_task(
        &self,
        task_id: TaskId,
        limit: Option<usize>,
    ) -> HistoryRepositoryResult<Vec<HistoryEntry>> {
        self.inner.history().list_recent_by_task(task_id, limit).await
    }

    async fn delete(&self, id: HistoryEntryId) -> HistoryRepositoryResult<()> {
        self.inner.history().delete(id).await
    }

    async fn delete_by_task(&self, task_id: TaskId) -> HistoryRepositoryResult<u64> {
        self.inner.history().delete_by_task(task_id).await
    }
}

/// In-memory store whose history adapter is [`AppendRefusingHistory`].
struct AppendRefusingStore {
    inner: InMemoryStore,
    history: AppendRefusingHistory,
}

impl AppendRefusingStore {
    fn over(inner: &InMemoryStore) -> Self {
        Self {
            inner: inner.clone(),
            history: AppendRefusingHistory {
                inner: inner.clone(),
            },
        }
    }
}

impl Store for AppendRefusingStore {
    type Users = InMemoryUserRepository;
    type Projects = InMemoryProjectRepository;
    type Members = InMemoryMembershipRepository;
    type Roles = InMemoryRoleCatalog;
    type Tasks = InMemoryTaskRepository;
    type History = AppendRefusingHistory;
    type Notifications = InMemoryNotificationRepository;

    fn users(&self) -> &Self::Users {
        self.inner.users()
    }

    fn projects(&self) -> &Self::Projects {
        self.inner.projects()
    }

    fn members(&self) -> &Self::Members {
        self.inner.members()
    }

    fn roles(&self) -> &Self::Roles {
        self.inner.roles()
    }

    fn tasks(&self) -> &Self::Tasks {
        self.inner.tasks()
    }

    fn history(&self) -> &Self::History {
        &self.history
    }

    fn notifications(&self) -> &Self::Notifications {
        self.inner.notifications()
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn priority_change_and_its_history_are_written_together(harness: Harness) {
    let alice = harness.user("alice").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;
    let tasks = TaskLifecycleService::new(
        Arc::new(AppendRefusingStore::over(&harness.store)),
        Arc::clone(&harness.clock),
    );

    let updated = tasks
        .update_task(
            Actor::User(alice.id()),
            task.id(),
            UpdateTaskRequest::new().with_priority(TaskPriority::Urgent),
        )
        .await
        .expect("update should not go through the standalone history adapter");

    assert_eq!(updated.priority(), TaskPriority::Urgent);
    let reloaded = harness.tasks.get_task(task.id()).await.expect("reload");
    assert_eq!(reloaded.priority(), TaskPriority::Urgent);
    let actions: Vec<HistoryAction> = harness
        .history
        .by_task(task.id())
        .await
        .expect("history")
        .iter()
        .map(|entry| entry.action())
        .collect();
    assert_eq!(
        actions,
        vec![HistoryAction::Created, HistoryAction::PriorityChanged]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deletion_marker_is_written_with_the_delete(harness: Harness) {
    let alice = harness.user("alice").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;
    let tasks = TaskLifecycleService::new(
        Arc::new(AppendRefusingStore::over(&harness.store)),
        Arc::clone(&harness.clock),
    );

    tasks
        .delete_task(Actor::User(alice.id()), task.id())
        .await
        .expect("delete should succeed");

    let trail = harness
        .history
        .by_project(project.id())
        .await
        .expect("history");
    let marker = trail.last().expect("deletion should leave a marker");
    assert_eq!(marker.action(), HistoryAction::Deleted);
    assert_eq!(marker.old_value(), Some("Design"));
    assert!(harness.history.by_task(task.id()).await.expect("history").is_empty());
}
