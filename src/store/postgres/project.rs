//! `PostgreSQL` project repository.

use super::{
    PgPool, contains_pattern,
    membership::to_member_row,
    models::{NewProjectRow, ProjectRow},
    run_blocking,
    schema::{project_members, projects},
};
use crate::membership::domain::{Member, RoleName};
use crate::project::{
    domain::{PersistedProjectData, Project, ProjectId, ProjectName},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed project repository.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_where<F>(&self, query: F) -> ProjectRepositoryResult<Vec<Project>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<ProjectRow>> + Send + 'static,
    {
        run_blocking(&self.pool, move |connection| {
            query(connection)
                .map_err(ProjectRepositoryError::persistence)?
                .into_iter()
                .map(row_to_project)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn create_with_owner(
        &self,
        project: &Project,
        owner: &Member,
    ) -> ProjectRepositoryResult<()> {
        let project_row = to_row(project);
        let member_row = to_member_row(owner);
        let project_id = project.id();
        run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, DieselError, _>(|tx| {
                    diesel::insert_into(projects::table)
                        .values(&project_row)
                        .execute(tx)?;
                    diesel::insert_into(project_members::table)
                        .values(&member_row)
                        .execute(tx)?;
                    Ok(())
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.table_name() == Some("projects") =>
                    {
                        ProjectRepositoryError::DuplicateProject(project_id)
                    }
                    _ => ProjectRepositoryError::persistence(err),
                })
        })
        .await
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let row = to_row(project);
        let project_id = project.id();
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(projects::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ProjectRepositoryError::NotFound(project_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        run_blocking(&self.pool, move |connection| {
            projects::table
                .find(id.into_inner())
                .select(ProjectRow::as_select())
                .first(connection)
                .optional()
                .map_err(ProjectRepositoryError::persistence)?
                .map(row_to_project)
                .transpose()
        })
        .await
    }

    async fn list_all(&self) -> ProjectRepositoryResult<Vec<Project>> {
        self.load_where(|connection| {
            projects::table
                .order((projects::created_at.asc(), projects::id.asc()))
                .select(ProjectRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_creator(&self, user_id: UserId) -> ProjectRepositoryResult<Vec<Project>> {
        self.load_where(move |connection| {
            projects::table
                .filter(projects::created_by.eq(user_id.into_inner()))
                .order((projects::created_at.asc(), projects::id.asc()))
                .select(ProjectRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_member(&self, user_id: UserId) -> ProjectRepositoryResult<Vec<Project>> {
        self.load_where(move |connection| {
            projects::table
                .filter(
                    projects::id.eq_any(
                        project_members::table
                            .filter(project_members::user_id.eq(user_id.into_inner()))
                            .select(project_members::project_id),
                    ),
                )
                .order((projects::created_at.asc(), projects::id.asc()))
                .select(ProjectRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_by_member_role(
        &self,
        user_id: UserId,
        role: RoleName,
    ) -> ProjectRepositoryResult<Vec<Project>> {
        let role_id = role.id().value();
        self.load_where(move |connection| {
            projects::table
                .filter(
                    projects::id.eq_any(
                        project_members::table
                            .filter(project_members::user_id.eq(user_id.into_inner()))
                            .filter(project_members::role_id.eq(role_id))
                            .select(project_members::project_id),
                    ),
                )
                .order((projects::created_at.asc(), projects::id.asc()))
                .select(ProjectRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn search_by_name(&self, fragment: &str) -> ProjectRepositoryResult<Vec<Project>> {
        let pattern = contains_pattern(fragment);
        self.load_where(move |connection| {
            projects::table
                .filter(projects::name.ilike(pattern))
                .order((projects::created_at.asc(), projects::id.asc()))
                .select(ProjectRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn list_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> ProjectRepositoryResult<Vec<Project>> {
        self.load_where(move |connection| {
            projects::table
                .filter(projects::created_at.ge(since))
                .order((projects::created_at.desc(), projects::id.desc()))
                .select(ProjectRow::as_select())
                .load(connection)
        })
        .await
    }

    async fn delete(&self, id: ProjectId) -> ProjectRepositoryResult<()> {
        run_blocking(&self.pool, move |connection| {
            let deleted = diesel::delete(projects::table.find(id.into_inner()))
                .execute(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(ProjectRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn to_row(project: &Project) -> NewProjectRow {
    NewProjectRow {
        id: project.id().into_inner(),
        name: project.name().as_str().to_owned(),
        description: project.description().map(str::to_owned),
        start_date: project.start_date(),
        created_by: project.created_by().into_inner(),
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    }
}

fn row_to_project(row: ProjectRow) -> ProjectRepositoryResult<Project> {
    let ProjectRow {
        id,
        name,
        description,
        start_date,
        created_by,
        created_at,
        updated_at,
    } = row;
    Ok(Project::from_persisted(PersistedProjectData {
        id: ProjectId::from_uuid(id),
        name: ProjectName::new(name).map_err(ProjectRepositoryError::persistence)?,
        description,
        start_date,
        created_by: UserId::from_uuid(created_by),
        created_at,
        updated_at,
    }))
}
