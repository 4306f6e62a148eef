//! In-memory store for tests and embedded use.
//!
//! Every repository shares one `RwLock`-guarded [`MemoryState`], so each
//! port call (including cascading deletes) observes and produces a
//! consistent snapshot.

mod history;
mod membership;
mod notification;
mod project;
mod task;
mod user;


pub use history::InMemoryHistoryRepository;
pub use membership::{InMemoryMembershipRepository, InMemoryRoleCatalog};
pub use notification::InMemoryNotificationRepository;
pub use project::InMemoryProjectRepository;
pub use task::InMemoryTaskRepository;
pub use user::InMemoryUserRepository;

use super::Store;
use crate::history::domain::{HistoryEntry, HistoryEntryId};
use crate::membership::domain::{Member, MemberId, Role};
use crate::notification::domain::{Notification, NotificationId};
use crate::project::domain::{Project, ProjectId};
use crate::task::domain::{Task, TaskId};
use crate::user::domain::{User, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type SharedState = Arc<RwLock<MemoryState>>;

/// Complete in-memory dataset.
#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    members: HashMap<MemberId, Member>,
    roles: Vec<Role>,
    tasks: HashMap<TaskId, Task>,
    history: Vec<HistoryEntry>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    /// Removes tasks matching `predicate` together with their history.
    fn remove_tasks_where(&mut self, predicate: impl Fn(&Task) -> bool) -> Vec<TaskId> {
        let removed: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| predicate(task))
            .map(Task::id)
            .collect();
        for id in &removed {
            self.tasks.remove(id);
        }
        self.history
            .retain(|entry| entry.task_id().is_none_or(|id| !removed.contains(&id)));
        removed
    }

    /// Returns the first effect whose identifier is already stored.
    fn find_taken_effect(
        &self,
        history: &[HistoryEntry],
        notifications: &[Notification],
    ) -> Option<TakenEffect> {
        history
            .iter()
            .find(|entry| self.history.iter().any(|existing| existing.id() == entry.id()))
            .map(|entry| TakenEffect::History(entry.id()))
            .or_else(|| {
                notifications
                    .iter()
                    .find(|notice| {
                        self.notifications
                            .iter()
                            .any(|existing| existing.id() == notice.id())
                    })
                    .map(|notice| TakenEffect::Notification(notice.id()))
            })
    }

    fn push_effects(&mut self, history: &[HistoryEntry], notifications: &[Notification]) {
        self.history.extend_from_slice(history);
        self.notifications.extend_from_slice(notifications);
    }
}

/// Identifier collision found while validating a combined write.
#[derive(Debug, Clone, Copy)]
enum TakenEffect {
    History(HistoryEntryId),
    Notification(NotificationId),
}

fn read_state<E>(
    state: &SharedState,
    map_err: impl FnOnce(std::io::Error) -> E,
) -> Result<RwLockReadGuard<'_, MemoryState>, E> {
    state
        .read()
        .map_err(|err| map_err(std::io::Error::other(err.to_string())))
}

fn write_state<E>(
    state: &SharedState,
    map_err: impl FnOnce(std::io::Error) -> E,
) -> Result<RwLockWriteGuard<'_, MemoryState>, E> {
    state
        .write()
        .map_err(|err| map_err(std::io::Error::other(err.to_string())))
}

/// Sorts records by creation time, breaking ties by identifier.
fn sort_by_creation<T, K: Ord>(
    records: &mut [T],
    created_at: impl Fn(&T) -> DateTime<Utc>,
    id: impl Fn(&T) -> K,
) {
    records.sort_by(|a, b| {
        created_at(a)
            .cmp(&created_at(b))
            .then_with(|| id(a).cmp(&id(b)))
    });
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Thread-safe in-memory implementation of every persistence port.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    users: InMemoryUserRepository,
    projects: InMemoryProjectRepository,
    members: InMemoryMembershipRepository,
    roles: InMemoryRoleCatalog,
    tasks: InMemoryTaskRepository,
    history: InMemoryHistoryRepository,
    notifications: InMemoryNotificationRepository,
}

impl InMemoryStore {
    /// Creates an empty store seeded with the role catalog.
    #[must_use]
    pub fn new() -> Self {
        let state: SharedState = Arc::new(RwLock::new(MemoryState {
            roles: Role::catalog(),
            ..MemoryState::default()
        }));
        Self {
            users: InMemoryUserRepository::new(Arc::clone(&state)),
            projects: InMemoryProjectRepository::new(Arc::clone(&state)),
            members: InMemoryMembershipRepository::new(Arc::clone(&state)),
            roles: InMemoryRoleCatalog::new(Arc::clone(&state)),
            tasks: InMemoryTaskRepository::new(Arc::clone(&state)),
            history: InMemoryHistoryRepository::new(Arc::clone(&state)),
            notifications: InMemoryNotificationRepository::new(state),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for InMemoryStore {
    type Users = InMemoryUserRepository;
    type Projects = InMemoryProjectRepository;
    type Members = InMemoryMembershipRepository;
    type Roles = InMemoryRoleCatalog;
    type Tasks = InMemoryTaskRepository;
    type History = InMemoryHistoryRepository;
    type Notifications = InMemoryNotificationRepository;

    fn users(&self) -> &Self::Users {
        &self.users
    }

    fn projects(&self) -> &Self::Projects {
        &self.projects
    }

    fn members(&self) -> &Self::Members {
        &self.members
    }

    fn roles(&self) -> &Self::Roles {
        &self.roles
    }

    fn tasks(&self) -> &Self::Tasks {
        &self.tasks
    }

    fn history(&self) -> &Self::History {
        &self.history
    }

    fn notifications(&self) -> &Self::Notifications {
        &self.notifications
    }
}
