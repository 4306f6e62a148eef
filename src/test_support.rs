//! Fixtures shared by the unit test modules.

use crate::history::services::HistoryLedgerService;
use crate::membership::{domain::Actor, services::MembershipRegistryService};
use crate::notification::services::NotificationEmitterService;
use crate::project::{
    domain::Project,
    services::{CreateProjectRequest, ProjectManagementService},
};
use crate::store::memory::InMemoryStore;
use crate::task::{
    domain::Task,
    services::{CreateTaskRequest, TaskLifecycleService},
};
use crate::user::{
    domain::User,
    services::{RegisterUserRequest, UserDirectoryService},
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::{Arc, Mutex};

/// Clock that advances by one second on every reading.
///
/// Consecutive records therefore get strictly increasing timestamps, which
/// keeps ordering assertions deterministic.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }

    /// Moves the clock by `delta` without producing a reading.
    pub fn advance(&self, delta: TimeDelta) {
        let mut next = self.next.lock().expect("clock lock");
        *next += delta;
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::starting_at(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
                .single()
                .expect("valid start instant"),
        )
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().expect("clock lock");
        let reading = *next;
        *next += TimeDelta::seconds(1);
        reading
    }
}

/// Every service wired to one in-memory store and one clock.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<SteppingClock>,
    pub users: UserDirectoryService<InMemoryStore, SteppingClock>,
    pub projects: ProjectManagementService<InMemoryStore, SteppingClock>,
    pub members: MembershipRegistryService<InMemoryStore, SteppingClock>,
    pub tasks: TaskLifecycleService<InMemoryStore, SteppingClock>,
    pub history: HistoryLedgerService<InMemoryStore, SteppingClock>,
    pub notifications: NotificationEmitterService<InMemoryStore, SteppingClock>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(SteppingClock::default());
        Self {
            users: UserDirectoryService::new(Arc::clone(&store), Arc::clone(&clock)),
            projects: ProjectManagementService::new(Arc::clone(&store), Arc::clone(&clock)),
            members: MembershipRegistryService::new(Arc::clone(&store), Arc::clone(&clock)),
            tasks: TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&clock)),
            history: HistoryLedgerService::new(Arc::clone(&store), Arc::clone(&clock)),
            notifications: NotificationEmitterService::new(Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
        }
    }

    /// Registers a user whose email is derived from the username.
    pub async fn user(&self, username: &str) -> User {
        self.users
            .register(RegisterUserRequest::new(
                username,
                format!("{username}@example.com"),
                "$argon2id$stub",
            ))
            .await
            .expect("user registration should succeed")
    }

    /// Creates a project owned by `owner`.
    pub async fn project(&self, owner: &User, name: &str) -> Project {
        self.projects
            .create(CreateProjectRequest::new(name), owner.id())
            .await
            .expect("project creation should succeed")
            .project
    }

    /// Adds `user` to `project` with `role`, acting as the project owner.
    pub async fn enroll(&self, project: &Project, user: &User, role: &str) {
        self.members
            .add_member(
                Actor::User(project.created_by()),
                project.id(),
                user.id(),
                role,
            )
            .await
            .expect("enrollment should succeed");
    }

    /// Creates a task in `project` as `actor`.
    pub async fn task(&self, actor: &User, project: &Project, title: &str) -> Task {
        self.tasks
            .create_task(
                Actor::User(actor.id()),
                CreateTaskRequest::new(project.id(), title),
            )
            .await
            .expect("task creation should succeed")
    }
}

#[fixture]
pub fn harness() -> Harness {
    Harness::new()
}
