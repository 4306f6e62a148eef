//! Service layer for user registration, lookup and deletion.

use crate::error::ErrorKind;
use crate::membership::{
    domain::{MembershipDomainError, RoleName},
    ports::{MembershipRepository, MembershipRepositoryError},
};
use crate::project::domain::ProjectId;
use crate::project::ports::{ProjectRepository, ProjectRepositoryError};
use crate::store::Store;
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::user::{
    domain::{
        CredentialHash, EmailAddress, User, UserDependents, UserDomainError, UserId, Username,
    },
    ports::{UserRepository, UserRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    username: String,
    email: String,
    credential_hash: String,
}

impl RegisterUserRequest {
    /// Creates a registration request.
    ///
    /// `credential_hash` must already be hashed by the caller.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        credential_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            credential_hash: credential_hash.into(),
        }
    }
}

/// Service-level errors for user directory operations.
#[derive(Debug, Error)]
pub enum UserServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] UserDomainError),
    /// The role name is not part of the catalog.
    #[error(transparent)]
    Role(#[from] MembershipDomainError),
    /// User repository operation failed.
    #[error(transparent)]
    Repository(#[from] UserRepositoryError),
    /// Project lookup failed while counting dependents.
    #[error(transparent)]
    Projects(#[from] ProjectRepositoryError),
    /// Task lookup failed while counting dependents.
    #[error(transparent)]
    Tasks(#[from] TaskRepositoryError),
    /// Membership lookup failed while counting dependents.
    #[error(transparent)]
    Members(#[from] MembershipRepositoryError),
    /// The user still owns or participates in project data.
    #[error("user {user_id} cannot be deleted while referenced: {dependents:?}")]
    HasDependents {
        /// User whose deletion was refused.
        user_id: UserId,
        /// Records that still reference the user.
        dependents: UserDependents,
    },
}

impl UserServiceError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Role(_) => ErrorKind::ValidationFailed,
            Self::Repository(
                UserRepositoryError::DuplicateUser(_)
                | UserRepositoryError::DuplicateUsername(_)
                | UserRepositoryError::DuplicateEmail(_),
            ) => ErrorKind::AlreadyExists,
            Self::Repository(UserRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::HasDependents { .. } => ErrorKind::Conflict,
            Self::Repository(UserRepositoryError::Persistence(_))
            | Self::Projects(_)
            | Self::Tasks(_)
            | Self::Members(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for user directory operations.
pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// User directory orchestration service.
#[derive(Clone)]
pub struct UserDirectoryService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> UserDirectoryService<S, C>
where
    S: Store,
    C: Clock + Send + Sync,
{
    /// Creates a new user directory service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Domain`] for invalid input or
    /// [`UserServiceError::Repository`] when the username or email is taken.
    pub async fn register(&self, request: RegisterUserRequest) -> UserServiceResult<User> {
        let RegisterUserRequest {
            username,
            email,
            credential_hash,
        } = request;

        let user = User::new(
            Username::new(username)?,
            EmailAddress::new(email)?,
            CredentialHash::new(credential_hash)?,
            &*self.clock,
        );
        self.store.users().store(&user).await?;
        info!(user_id = %user.id(), username = %user.username(), "registered user");
        Ok(user)
    }

    /// Retrieves a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UserRepositoryError::NotFound`] (wrapped) when the user does
    /// not exist.
    pub async fn get(&self, id: UserId) -> UserServiceResult<User> {
        self.store
            .users()
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::Repository(UserRepositoryError::NotFound(id)))
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Domain`] when the username is malformed.
    pub async fn find_by_username(&self, username: &str) -> UserServiceResult<Option<User>> {
        let parsed = Username::new(username)?;
        Ok(self.store.users().find_by_username(&parsed).await?)
    }

    /// Finds a user by email address.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Domain`] when the address is malformed.
    pub async fn find_by_email(&self, email: &str) -> UserServiceResult<Option<User>> {
        let parsed = EmailAddress::new(email)?;
        Ok(self.store.users().find_by_email(&parsed).await?)
    }

    /// Returns every registered user.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Repository`] when the lookup fails.
    pub async fn list(&self) -> UserServiceResult<Vec<User>> {
        Ok(self.store.users().list_all().await?)
    }

    /// Returns users whose username contains `fragment`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Repository`] when the lookup fails.
    pub async fn search_by_username(&self, fragment: &str) -> UserServiceResult<Vec<User>> {
        debug!(fragment, "searching users by username");
        Ok(self.store.users().search_by_username(fragment.trim()).await?)
    }

    /// Returns users whose email address contains `fragment`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Repository`] when the lookup fails.
    pub async fn search_by_email(&self, fragment: &str) -> UserServiceResult<Vec<User>> {
        debug!(fragment, "searching users by email");
        Ok(self.store.users().search_by_email(fragment.trim()).await?)
    }

    /// Returns the users enrolled in a project.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Repository`] when the lookup fails.
    pub async fn members_of_project(&self, project_id: ProjectId) -> UserServiceResult<Vec<User>> {
        Ok(self.store.users().list_by_project(project_id).await?)
    }

    /// Returns the users holding `role_name` in a project, in enrollment
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Role`] for names outside the role catalog.
    pub async fn members_of_project_with_role(
        &self,
        project_id: ProjectId,
        role_name: &str,
    ) -> UserServiceResult<Vec<User>> {
        let role = RoleName::try_from(role_name)?;
        let members = self
            .store
            .members()
            .list_by_project_and_role(project_id, role)
            .await?;
        let mut users = Vec::with_capacity(members.len());
        for member in members {
            if let Some(user) = self.store.users().find_by_id(member.user_id()).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Returns users assigned to at least one task.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Repository`] when the lookup fails.
    pub async fn with_assigned_tasks(&self) -> UserServiceResult<Vec<User>> {
        Ok(self.store.users().list_with_assigned_tasks().await?)
    }

    /// Replaces a user's credential hash.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::Domain`] for a blank hash or
    /// [`UserServiceError::Repository`] when the user does not exist.
    pub async fn update_credential(
        &self,
        id: UserId,
        credential_hash: impl Into<String>,
    ) -> UserServiceResult<User> {
        let credential = CredentialHash::new(credential_hash)?;
        let mut user = self.get(id).await?;
        user.replace_credential(credential, &*self.clock);
        self.store.users().update(&user).await?;
        info!(user_id = %id, "replaced user credential");
        Ok(user)
    }

    /// Counts the records that still reference a user.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError`] when any lookup fails.
    pub async fn dependents(&self, id: UserId) -> UserServiceResult<UserDependents> {
        let created_projects = self.store.projects().list_by_creator(id).await?.len();
        let created_tasks = self.store.tasks().list_by_creator(id).await?.len();
        let assigned_tasks = self.store.tasks().list_by_assignee(id).await?.len();
        let memberships = self.store.members().list_by_user(id).await?.len();
        Ok(UserDependents {
            created_projects,
            created_tasks,
            assigned_tasks,
            memberships,
        })
    }

    /// Deletes a user that no project data references.
    ///
    /// Notifications addressed to the user are deleted with it. History
    /// entries authored by the user are kept.
    ///
    /// # Errors
    ///
    /// Returns [`UserServiceError::HasDependents`] while projects, tasks or
    /// memberships reference the user, or [`UserServiceError::Repository`]
    /// when the user does not exist.
    pub async fn delete(&self, id: UserId) -> UserServiceResult<()> {
        self.get(id).await?;
        let dependents = self.dependents(id).await?;
        if !dependents.is_empty() {
            warn!(user_id = %id, ?dependents, "refused to delete referenced user");
            return Err(UserServiceError::HasDependents {
                user_id: id,
                dependents,
            });
        }
        self.store.users().delete(id).await?;
        info!(user_id = %id, "deleted user");
        Ok(())
    }
}
