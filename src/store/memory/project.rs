//! In-memory project repository.

use super::{SharedState, read_state, sort_by_creation, write_state};
use crate::membership::domain::{Member, RoleName};
use crate::project::{
    domain::{Project, ProjectId},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use crate::user::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io;

/// Project repository over the shared in-memory state.
#[derive(Debug, Clone)]
pub struct InMemoryProjectRepository {
    state: SharedState,
}

impl InMemoryProjectRepository {
    pub(super) const fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn collect_where(
        &self,
        predicate: impl Fn(&Project) -> bool,
    ) -> ProjectRepositoryResult<Vec<Project>> {
        let state = read_state(&self.state, ProjectRepositoryError::persistence)?;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|project| predicate(project))
            .cloned()
            .collect();
        sort_by_creation(&mut projects, Project::created_at, Project::id);
        Ok(projects)
    }

    fn projects_joined_by(
        &self,
        user_id: UserId,
        role: Option<RoleName>,
    ) -> ProjectRepositoryResult<Vec<Project>> {
        let joined: HashSet<ProjectId> = {
            let state = read_state(&self.state, ProjectRepositoryError::persistence)?;
            state
                .members
                .values()
                .filter(|member| member.user_id() == user_id)
                .filter(|member| role.is_none_or(|wanted| member.role() == wanted))
                .map(Member::project_id)
                .collect()
        };
        self.collect_where(|project| joined.contains(&project.id()))
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn create_with_owner(
        &self,
        project: &Project,
        owner: &Member,
    ) -> ProjectRepositoryResult<()> {
        if owner.project_id() != project.id() {
            return Err(ProjectRepositoryError::persistence(io::Error::other(
                "owner membership references a different project",
            )));
        }
        let mut state = write_state(&self.state, ProjectRepositoryError::persistence)?;
        if state.projects.contains_key(&project.id()) {
            return Err(ProjectRepositoryError::DuplicateProject(project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        state.members.insert(owner.id(), owner.clone());
        Ok(())
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut state = write_state(&self.state, ProjectRepositoryError::persistence)?;
        let stored = state
            .projects
            .get_mut(&project.id())
            .ok_or(ProjectRepositoryError::NotFound(project.id()))?;
        *stored = project.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let state = read_state(&self.state, ProjectRepositoryError::persistence)?;
        Ok(state.projects.get(&id).cloned())
    }

    async fn list_all(&self) -> ProjectRepositoryResult<Vec<Project>> {
        self.collect_where(|_| true)
    }

    async fn list_by_creator(&self, user_id: UserId) -> ProjectRepositoryResult<Vec<Project>> {
        self.collect_where(|project| project.created_by() == user_id)
    }

    async fn list_by_member(&self, user_id: UserId) -> ProjectRepositoryResult<Vec<Project>> {
        self.projects_joined_by(user_id, None)
    }

    async fn list_by_member_role(
        &self,
        user_id: UserId,
        role: RoleName,
    ) -> ProjectRepositoryResult<Vec<Project>> {
        self.projects_joined_by(user_id, Some(role))
    }

    async fn search_by_name(&self, fragment: &str) -> ProjectRepositoryResult<Vec<Project>> {
        let needle = fragment.to_lowercase();
        self.collect_where(|project| project.name().as_str().to_lowercase().contains(&needle))
    }

    async fn list_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> ProjectRepositoryResult<Vec<Project>> {
        let mut projects = self.collect_where(|project| project.created_at() >= since)?;
        projects.reverse();
        Ok(projects)
    }

    async fn delete(&self, id: ProjectId) -> ProjectRepositoryResult<()> {
        let mut state = write_state(&self.state, ProjectRepositoryError::persistence)?;
        if state.projects.remove(&id).is_none() {
            return Err(ProjectRepositoryError::NotFound(id));
        }
        state.members.retain(|_, member| member.project_id() != id);
        state.remove_tasks_where(|task| task.project_id() == id);
        state
            .history
            .retain(|entry| entry.project_id() != Some(id));
        Ok(())
    }
}
