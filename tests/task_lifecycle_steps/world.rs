//! Shared world state for task lifecycle BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use pmt::history::services::HistoryLedgerService;
use pmt::notification::services::NotificationEmitterService;
use pmt::project::{domain::Project, services::ProjectManagementService};
use pmt::store::memory::InMemoryStore;
use pmt::task::{
    domain::Task,
    services::{TaskLifecycleError, TaskLifecycleService},
};
use pmt::user::{
    domain::User,
    services::{RegisterUserRequest, UserDirectoryService},
};
use rstest::fixture;

/// Scenario world for task lifecycle behaviour tests.
pub struct TaskLifecycleWorld {
    pub users: UserDirectoryService<InMemoryStore, DefaultClock>,
    pub projects: ProjectManagementService<InMemoryStore, DefaultClock>,
    pub tasks: TaskLifecycleService<InMemoryStore, DefaultClock>,
    pub history: HistoryLedgerService<InMemoryStore, DefaultClock>,
    pub notifications: NotificationEmitterService<InMemoryStore, DefaultClock>,
    pub people: HashMap<String, User>,
    pub project: Option<Project>,
    pub task: Option<Task>,
    pub last_result: Option<Result<Task, TaskLifecycleError>>,
}

impl TaskLifecycleWorld {
    /// Creates a world over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(DefaultClock);
        Self {
            users: UserDirectoryService::new(Arc::clone(&store), Arc::clone(&clock)),
            projects: ProjectManagementService::new(Arc::clone(&store), Arc::clone(&clock)),
            tasks: TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&clock)),
            history: HistoryLedgerService::new(Arc::clone(&store), Arc::clone(&clock)),
            notifications: NotificationEmitterService::new(store, clock),
            people: HashMap::new(),
            project: None,
            task: None,
            last_result: None,
        }
    }

    /// Returns the named user, registering them on first mention.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails.
    pub fn person(&mut self, username: &str) -> Result<User, eyre::Report> {
        if let Some(user) = self.people.get(username) {
            return Ok(user.clone());
        }
        let user = run_async(self.users.register(RegisterUserRequest::new(
            username,
            format!("{username}@example.com"),
            "$argon2id$v=19$stub",
        )))?;
        self.people.insert(username.to_owned(), user.clone());
        Ok(user)
    }

    /// Returns the scenario project.
    ///
    /// # Errors
    ///
    /// Returns an error if no project has been created yet.
    pub fn current_project(&self) -> Result<&Project, eyre::Report> {
        self.project
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }

    /// Returns the most recently created task.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has been created yet.
    pub fn current_task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for TaskLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskLifecycleWorld {
    TaskLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
