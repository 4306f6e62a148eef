//! In-memory user repository.

use super::{SharedState, read_state, sort_by_creation, write_state};
use crate::project::domain::ProjectId;
use crate::task::domain::Task;
use crate::user::{
    domain::{EmailAddress, User, UserId, Username},
    ports::{UserRepository, UserRepositoryError, UserRepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashSet;

/// User repository over the shared in-memory state.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    state: SharedState,
}

impl InMemoryUserRepository {
    pub(super) const fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Returns matching users ordered by registration time.
    fn collect_where(&self, predicate: impl Fn(&User) -> bool) -> UserRepositoryResult<Vec<User>> {
        let state = read_state(&self.state, UserRepositoryError::persistence)?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| predicate(user))
            .cloned()
            .collect();
        sort_by_creation(&mut users, User::created_at, User::id);
        Ok(users)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn store(&self, user: &User) -> UserRepositoryResult<()> {
        let mut state = write_state(&self.state, UserRepositoryError::persistence)?;
        if state.users.contains_key(&user.id()) {
            return Err(UserRepositoryError::DuplicateUser(user.id()));
        }
        if state
            .users
            .values()
            .any(|existing| existing.username() == user.username())
        {
            return Err(UserRepositoryError::DuplicateUsername(
                user.username().clone(),
            ));
        }
        if state
            .users
            .values()
            .any(|existing| existing.email() == user.email())
        {
            return Err(UserRepositoryError::DuplicateEmail(user.email().clone()));
        }
        state.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> UserRepositoryResult<()> {
        let mut state = write_state(&self.state, UserRepositoryError::persistence)?;
        let stored = state
            .users
            .get_mut(&user.id())
            .ok_or(UserRepositoryError::NotFound(user.id()))?;
        *stored = user.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<User>> {
        let state = read_state(&self.state, UserRepositoryError::persistence)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> UserRepositoryResult<Option<User>> {
        let state = read_state(&self.state, UserRepositoryError::persistence)?;
        Ok(state
            .users
            .values()
            .find(|user| user.username() == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> UserRepositoryResult<Option<User>> {
        let state = read_state(&self.state, UserRepositoryError::persistence)?;
        Ok(state
            .users
            .values()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn list_all(&self) -> UserRepositoryResult<Vec<User>> {
        self.collect_where(|_| true)
    }

    async fn search_by_username(&self, fragment: &str) -> UserRepositoryResult<Vec<User>> {
        let needle = fragment.to_lowercase();
        self.collect_where(|user| user.username().as_str().to_lowercase().contains(&needle))
    }

    async fn search_by_email(&self, fragment: &str) -> UserRepositoryResult<Vec<User>> {
        let needle = fragment.to_lowercase();
        self.collect_where(|user| user.email().as_str().to_lowercase().contains(&needle))
    }

    async fn list_with_assigned_tasks(&self) -> UserRepositoryResult<Vec<User>> {
        let assignees: HashSet<UserId> = {
            let state = read_state(&self.state, UserRepositoryError::persistence)?;
            state.tasks.values().filter_map(Task::assignee_id).collect()
        };
        self.collect_where(|user| assignees.contains(&user.id()))
    }

    async fn list_by_project(&self, project_id: ProjectId) -> UserRepositoryResult<Vec<User>> {
        let state = read_state(&self.state, UserRepositoryError::persistence)?;
        let mut memberships: Vec<_> = state
            .members
            .values()
            .filter(|member| member.project_id() == project_id)
            .collect();
        memberships.sort_by_key(|member| (member.joined_at(), member.id()));
        Ok(memberships
            .into_iter()
            .filter_map(|member| state.users.get(&member.user_id()).cloned())
            .collect())
    }

    async fn delete(&self, id: UserId) -> UserRepositoryResult<()> {
        let mut state = write_state(&self.state, UserRepositoryError::persistence)?;
        if state.users.remove(&id).is_none() {
            return Err(UserRepositoryError::NotFound(id));
        }
        state
            .notifications
            .retain(|notification| notification.user_id() != id);
        Ok(())
    }
}
