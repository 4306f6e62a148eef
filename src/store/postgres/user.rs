//! `PostgreSQL` user repository.

use super::{
    PgPool, contains_pattern,
    models::{NewUserRow, UserRow},
    run_blocking,
    schema::{project_members, tasks, users},
    violates,
};
use crate::project::domain::ProjectId;
use crate::user::{
    domain::{CredentialHash, EmailAddress, PersistedUserData, User, UserId, Username},
    ports::{UserRepository, UserRepositoryError, UserRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed user repository.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn store(&self, user: &User) -> UserRepositoryResult<()> {
        let row = to_row(user);
        let (user_id, username, email) = (user.id(), user.username().clone(), user.email().clone());
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), "users_username_key") =>
                    {
                        UserRepositoryError::DuplicateUsername(username)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), "users_email_key") =>
                    {
                        UserRepositoryError::DuplicateEmail(email)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        UserRepositoryError::DuplicateUser(user_id)
                    }
                    _ => UserRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, user: &User) -> UserRepositoryResult<()> {
        let row = to_row(user);
        let user_id = user.id();
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(users::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(UserRepositoryError::persistence)?;
            if updated == 0 {
                return Err(UserRepositoryError::NotFound(user_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .find(id.into_inner())
                .select(UserRow::as_select())
                .first(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn find_by_username(&self, username: &Username) -> UserRepositoryResult<Option<User>> {
        let lookup = username.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::username.eq(lookup))
                .select(UserRow::as_select())
                .first(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> UserRepositoryResult<Option<User>> {
        let lookup = email.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::email.eq(lookup))
                .select(UserRow::as_select())
                .first(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn list_all(&self) -> UserRepositoryResult<Vec<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .order((users::created_at.asc(), users::id.asc()))
                .select(UserRow::as_select())
                .load(connection)
                .map_err(UserRepositoryError::persistence)?
                .into_iter()
                .map(row_to_user)
                .collect()
        })
        .await
    }

    async fn search_by_username(&self, fragment: &str) -> UserRepositoryResult<Vec<User>> {
        let pattern = contains_pattern(fragment);
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::username.ilike(pattern))
                .order((users::created_at.asc(), users::id.asc()))
                .select(UserRow::as_select())
                .load(connection)
                .map_err(UserRepositoryError::persistence)?
                .into_iter()
                .map(row_to_user)
                .collect()
        })
        .await
    }

    async fn search_by_email(&self, fragment: &str) -> UserRepositoryResult<Vec<User>> {
        let pattern = contains_pattern(fragment);
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::email.ilike(pattern))
                .order((users::created_at.asc(), users::id.asc()))
                .select(UserRow::as_select())
                .load(connection)
                .map_err(UserRepositoryError::persistence)?
                .into_iter()
                .map(row_to_user)
                .collect()
        })
        .await
    }

    async fn list_with_assigned_tasks(&self) -> UserRepositoryResult<Vec<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(
                    users::id
                        .nullable()
                        .eq_any(tasks::table.select(tasks::assignee_id)),
                )
                .order((users::created_at.asc(), users::id.asc()))
                .select(UserRow::as_select())
                .load(connection)
                .map_err(UserRepositoryError::persistence)?
                .into_iter()
                .map(row_to_user)
                .collect()
        })
        .await
    }

    async fn list_by_project(&self, project_id: ProjectId) -> UserRepositoryResult<Vec<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .inner_join(project_members::table.on(project_members::user_id.eq(users::id)))
                .filter(project_members::project_id.eq(project_id.into_inner()))
                .order((project_members::joined_at.asc(), project_members::id.asc()))
                .select(UserRow::as_select())
                .load(connection)
                .map_err(UserRepositoryError::persistence)?
                .into_iter()
                .map(row_to_user)
                .collect()
        })
        .await
    }

    async fn delete(&self, id: UserId) -> UserRepositoryResult<()> {
        run_blocking(&self.pool, move |connection| {
            let deleted = diesel::delete(users::table.find(id.into_inner()))
                .execute(connection)
                .map_err(UserRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(UserRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn to_row(user: &User) -> NewUserRow {
    NewUserRow {
        id: user.id().into_inner(),
        username: user.username().as_str().to_owned(),
        email: user.email().as_str().to_owned(),
        password_hash: user.credential().as_str().to_owned(),
        created_at: user.created_at(),
        updated_at: user.updated_at(),
    }
}

fn row_to_user(row: UserRow) -> UserRepositoryResult<User> {
    let UserRow {
        id,
        username,
        email,
        password_hash,
        created_at,
        updated_at,
    } = row;
    Ok(User::from_persisted(PersistedUserData {
        id: UserId::from_uuid(id),
        username: Username::new(username).map_err(UserRepositoryError::persistence)?,
        email: EmailAddress::new(email).map_err(UserRepositoryError::persistence)?,
        credential: CredentialHash::new(password_hash).map_err(UserRepositoryError::persistence)?,
        created_at,
        updated_at,
    }))
}
