//! Shared fixtures for in-memory store integration tests.

use crate::test_helpers::Services;
use pmt::project::{domain::Project, services::CreateProjectRequest};
use pmt::store::memory::InMemoryStore;
use pmt::user::{domain::User, services::RegisterUserRequest};
use rstest::fixture;
use std::sync::Arc;

/// Services over a fresh in-memory store.
pub type MemoryServices = Services<InMemoryStore>;

/// Provides services over an empty store.
#[fixture]
pub fn services() -> MemoryServices {
    Services::over(Arc::new(InMemoryStore::new()))
}

/// Registers a user whose email is derived from the username.
///
/// # Errors
///
/// Returns an error if registration fails.
pub async fn register(services: &MemoryServices, username: &str) -> Result<User, eyre::Report> {
    Ok(services
        .users
        .register(RegisterUserRequest::new(
            username,
            format!("{username}@example.com"),
            "$argon2id$v=19$stub",
        ))
        .await?)
}

/// Creates a project owned by `owner`.
///
/// # Errors
///
/// Returns an error if creation fails.
pub async fn create_project(
    services: &MemoryServices,
    owner: &User,
    name: &str,
) -> Result<Project, eyre::Report> {
    Ok(services
        .projects
        .create(CreateProjectRequest::new(name), owner.id())
        .await?
        .project)
}
