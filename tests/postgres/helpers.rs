//! Shared fixtures for `PostgreSQL` store integration tests.

use crate::test_helpers::Services;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use once_cell::sync::OnceCell;
use pmt::config::StoreConfig;
use pmt::store::postgres::{CORE_SCHEMA_SQL, PostgresStore, connect};
use pmt::user::{domain::User, services::RegisterUserRequest};
use std::env;
use std::sync::Arc;
use uuid::Uuid;

/// Variable naming the database used by these tests.
pub const TEST_DATABASE_URL: &str = "PMT_TEST_DATABASE_URL";

/// Services over the `PostgreSQL` store.
pub type PgServices = Services<PostgresStore>;

static SCHEMA_READY: OnceCell<()> = OnceCell::new();

/// Applies the core schema once per test binary and connects to the test
/// database.
///
/// Returns `None` when [`TEST_DATABASE_URL`] is unset.
///
/// # Errors
///
/// Returns an error if the pool cannot be built or the schema fails.
pub fn pg_services() -> Result<Option<PgServices>, eyre::Report> {
    let Some(database_url) = env::var(TEST_DATABASE_URL).ok() else {
        return Ok(None);
    };
    let config = StoreConfig::from_lookup(|key| {
        (key == "DATABASE_URL").then(|| database_url.clone())
    })?;
    tokio::task::block_in_place(|| -> Result<Option<PgServices>, eyre::Report> {
        SCHEMA_READY.get_or_try_init(|| apply_schema(&config.database_url))?;
        let pool = connect(&config)?;
        Ok(Some(Services::over(Arc::new(PostgresStore::new(pool)))))
    })
}

/// Applies the core schema over a dedicated connection.
fn apply_schema(database_url: &str) -> Result<(), eyre::Report> {
    let mut connection = PgConnection::establish(database_url)?;
    connection.batch_execute(CORE_SCHEMA_SQL)?;
    Ok(())
}

/// Returns a username that no other test run has used.
pub fn unique_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", suffix.get(..12).unwrap_or(&suffix))
}

/// Registers a uniquely named user.
///
/// # Errors
///
/// Returns an error if registration fails.
pub async fn register(services: &PgServices, prefix: &str) -> Result<User, eyre::Report> {
    let username = unique_name(prefix);
    Ok(services
        .users
        .register(RegisterUserRequest::new(
            username.clone(),
            format!("{username}@example.com"),
            "$argon2id$v=19$stub",
        ))
        .await?)
}
