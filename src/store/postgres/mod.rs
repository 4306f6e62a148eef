//! `PostgreSQL` store backed by Diesel and an r2d2 connection pool.
//!
//! Diesel is synchronous, so every repository call checks a connection out
//! of the pool inside `tokio::task::spawn_blocking`. Cascading deletes rely
//! on the `ON DELETE CASCADE` foreign keys declared by the core migration.

mod history;
mod membership;
mod migrations;
mod models;
mod notification;
mod project;
mod schema;
mod task;
mod user;

pub use history::PostgresHistoryRepository;
pub use membership::{PostgresMembershipRepository, PostgresRoleCatalog};
pub use migrations::{CORE_SCHEMA_SQL, SchemaError, apply_core_schema};
pub use notification::PostgresNotificationRepository;
pub use project::PostgresProjectRepository;
pub use task::PostgresTaskRepository;
pub use user::PostgresUserRepository;

use super::Store;
use crate::config::StoreConfig;
use crate::history::ports::HistoryRepositoryError;
use crate::membership::ports::MembershipRepositoryError;
use crate::notification::ports::NotificationRepositoryError;
use crate::project::ports::ProjectRepositoryError;
use crate::task::ports::TaskRepositoryError;
use crate::user::ports::UserRepositoryError;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::result::{DatabaseErrorInformation, Error as DieselError};
use models::{NewHistoryRow, NewNotificationRow};

/// `PostgreSQL` connection pool type shared by every repository.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool from store configuration.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be
/// established.
pub fn connect(config: &StoreConfig) -> Result<PgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(config.connect_timeout)
        .build(manager)
}

/// Repository error types that can wrap an arbitrary storage failure.
trait PersistenceError: Send + 'static {
    fn from_storage(err: impl std::error::Error + Send + Sync + 'static) -> Self;
}

impl PersistenceError for UserRepositoryError {
    fn from_storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceError for ProjectRepositoryError {
    fn from_storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceError for MembershipRepositoryError {
    fn from_storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceError for TaskRepositoryError {
    fn from_storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceError for HistoryRepositoryError {
    fn from_storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

impl PersistenceError for NotificationRepositoryError {
    fn from_storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

/// Runs a blocking Diesel operation on a pooled connection.
async fn run_blocking<F, T, E>(pool: &PgPool, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: PersistenceError,
{
    let worker_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = worker_pool.get().map_err(E::from_storage)?;
        f(&mut connection)
    })
    .await
    .map_err(E::from_storage)?
}

/// Returns `true` when a database error names the given constraint.
fn violates(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

/// Builds a case-insensitive substring pattern with `LIKE` wildcards escaped.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn count(rows: i64) -> u64 {
    u64::try_from(rows).unwrap_or(0)
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

/// Failure inside a multi-statement transaction: either a query error or a
/// repository-level rejection that rolls the transaction back.
#[derive(Debug)]
enum TxError<E> {
    Query(DieselError),
    Rejected(E),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(err: DieselError) -> Self {
        Self::Query(err)
    }
}

impl<E: PersistenceError> TxError<E> {
    fn resolve(self) -> E {
        match self {
            Self::Query(err) => E::from_storage(err),
            Self::Rejected(err) => err,
        }
    }
}

/// Inserts history and notification rows on an open transaction.
///
/// History rows go in one statement each so `seq` follows slice order.
fn insert_effects(
    connection: &mut PgConnection,
    history: &[NewHistoryRow],
    notices: &[NewNotificationRow],
) -> QueryResult<()> {
    for row in history {
        diesel::insert_into(schema::task_history::table)
            .values(row)
            .execute(connection)?;
    }
    if !notices.is_empty() {
        diesel::insert_into(schema::notifications::table)
            .values(notices)
            .execute(connection)?;
    }
    Ok(())
}

/// Store backed by a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    users: PostgresUserRepository,
    projects: PostgresProjectRepository,
    members: PostgresMembershipRepository,
    roles: PostgresRoleCatalog,
    tasks: PostgresTaskRepository,
    history: PostgresHistoryRepository,
    notifications: PostgresNotificationRepository,
}

impl PostgresStore {
    /// Creates a store whose repositories share `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: PostgresUserRepository::new(pool.clone()),
            projects: PostgresProjectRepository::new(pool.clone()),
            members: PostgresMembershipRepository::new(pool.clone()),
            roles: PostgresRoleCatalog::new(pool.clone()),
            tasks: PostgresTaskRepository::new(pool.clone()),
            history: PostgresHistoryRepository::new(pool.clone()),
            notifications: PostgresNotificationRepository::new(pool),
        }
    }
}

impl Store for PostgresStore {
    type Users = PostgresUserRepository;
    type Projects = PostgresProjectRepository;
    type Members = PostgresMembershipRepository;
    type Roles = PostgresRoleCatalog;
    type Tasks = PostgresTaskRepository;
    type History = PostgresHistoryRepository;
    type Notifications = PostgresNotificationRepository;

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
