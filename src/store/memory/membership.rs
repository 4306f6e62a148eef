//! In-memory membership repository and role catalog.

use super::{MemoryState, SharedState, TakenEffect, count, read_state, write_state};
use crate::membership::{
    domain::{Member, MemberId, Role, RoleId, RoleName},
    ports::{
        MembershipRepository, MembershipRepositoryError, MembershipRepositoryResult, RoleCatalog,
    },
};
use crate::notification::domain::Notification;
use crate::project::domain::ProjectId;
use crate::user::domain::UserId;
use async_trait::async_trait;

/// Membership repository over the shared in-memory state.
#[derive(Debug, Clone)]
pub struct InMemoryMembershipRepository {
    state: SharedState,
}

impl InMemoryMembershipRepository {
    pub(super) const fn new(state: SharedState) -> Self {
        Self { state }
    }

    fn collect_where(
        &self,
        predicate: impl Fn(&Member) -> bool,
    ) -> MembershipRepositoryResult<Vec<Member>> {
        let state = read_state(&self.state, MembershipRepositoryError::persistence)?;
        let mut members: Vec<Member> = state
            .members
            .values()
            .filter(|member| predicate(member))
            .cloned()
            .collect();
        members.sort_by_key(|member| (member.joined_at(), member.id()));
        Ok(members)
    }
}

/// Rejects a membership whose identifier or project/user pair is taken.
fn check_enrollable(state: &MemoryState, member: &Member) -> MembershipRepositoryResult<()> {
    if state.members.contains_key(&member.id()) {
        return Err(MembershipRepositoryError::DuplicateMember(member.id()));
    }
    let enrolled = state.members.values().any(|existing| {
        existing.project_id() == member.project_id() && existing.user_id() == member.user_id()
    });
    if enrolled {
        return Err(MembershipRepositoryError::AlreadyMember {
            project_id: member.project_id(),
            user_id: member.user_id(),
        });
    }
    Ok(())
}

/// Returns `true` when `stored` is the only `ADMIN` of its project.
fn is_last_admin(state: &MemoryState, stored: &Member) -> bool {
    stored.role() == RoleName::Admin
        && !state.members.values().any(|other| {
            other.id() != stored.id()
                && other.project_id() == stored.project_id()
                && other.role() == RoleName::Admin
        })
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn store(&self, member: &Member) -> MembershipRepositoryResult<()> {
        let mut state = write_state(&self.state, MembershipRepositoryError::persistence)?;
        check_enrollable(&state, member)?;
        state.members.insert(member.id(), member.clone());
        Ok(())
    }

    async fn enroll(
        &self,
        member: &Member,
        notice: &Notification,
    ) -> MembershipRepositoryResult<()> {
        let mut state = write_state(&self.state, MembershipRepositoryError::persistence)?;
        check_enrollable(&state, member)?;
        let notices = std::slice::from_ref(notice);
        if let Some(TakenEffect::Notification(id)) = state.find_taken_effect(&[], notices) {
            return Err(MembershipRepositoryError::DuplicateNotification(id));
        }
        state.members.insert(member.id(), member.clone());
        state.push_effects(&[], notices);
        Ok(())
    }

    async fn update(&self, member: &Member) -> MembershipRepositoryResult<()> {
        let mut state = write_state(&self.state, MembershipRepositoryError::persistence)?;
        let stored = state
            .members
            .get(&member.id())
            .ok_or(MembershipRepositoryError::NotFound(member.id()))?;
        if member.role() != RoleName::Admin && is_last_admin(&state, stored) {
            return Err(MembershipRepositoryError::LastAdmin(stored.project_id()));
        }
        state.members.insert(member.id(), member.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MemberId) -> MembershipRepositoryResult<Option<Member>> {
        let state = read_state(&self.state, MembershipRepositoryError::persistence)?;
        Ok(state.members.get(&id).cloned())
    }

    async fn find(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> MembershipRepositoryResult<Option<Member>> {
        let state = read_state(&self.state, MembershipRepositoryError::persistence)?;
        Ok(state
            .members
            .values()
            .find(|member| member.project_id() == project_id && member.user_id() == user_id)
            .cloned())
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> MembershipRepositoryResult<Vec<Member>> {
        self.collect_where(|member| member.project_id() == project_id)
    }

    async fn list_by_user(&self, user_id: UserId) -> MembershipRepositoryResult<Vec<Member>> {
        self.collect_where(|member| member.user_id() == user_id)
    }

    async fn list_by_role(&self, role: RoleName) -> MembershipRepositoryResult<Vec<Member>> {
        self.collect_where(|member| member.role() == role)
    }

    async fn list_by_project_and_role(
        &self,
        project_id: ProjectId,
        role: RoleName,
    ) -> MembershipRepositoryResult<Vec<Member>> {
        self.collect_where(|member| member.project_id() == project_id && member.role() == role)
    }

    async fn count_by_project(&self, project_id: ProjectId) -> MembershipRepositoryResult<u64> {
        let state = read_state(&self.state, MembershipRepositoryError::persistence)?;
        Ok(count(
            state
                .members
                .values()
                .filter(|member| member.project_id() == project_id)
                .count(),
        ))
    }

    async fn delete(&self, id: MemberId) -> MembershipRepositoryResult<()> {
        let mut state = write_state(&self.state, MembershipRepositoryError::persistence)?;
        let stored = state
            .members
            .get(&id)
            .ok_or(MembershipRepositoryError::NotFound(id))?;
        if is_last_admin(&state, stored) {
            return Err(MembershipRepositoryError::LastAdmin(stored.project_id()));
        }
        state.members.remove(&id);
        Ok(())
    }
}

/// Role catalog over the shared in-memory state.
#[derive(Debug, Clone)]
pub struct InMemoryRoleCatalog {
    state: SharedState,
}

impl InMemoryRoleCatalog {
    pub(super) const fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl RoleCatalog for InMemoryRoleCatalog {
    async fn list_roles(&self) -> MembershipRepositoryResult<Vec<Role>> {
        let state = read_state(&self.state, MembershipRepositoryError::persistence)?;
        let mut roles = state.roles.clone();
        roles.sort_by_key(Role::id);
        Ok(roles)
    }

    async fn find_role_by_name(&self, name: RoleName) -> MembershipRepositoryResult<Option<Role>> {
        let state = read_state(&self.state, MembershipRepositoryError::persistence)?;
        Ok(state.roles.iter().find(|role| role.name() == name).copied())
    }

    async fn find_role_by_id(&self, id: RoleId) -> MembershipRepositoryResult<Option<Role>> {
        let state = read_state(&self.state, MembershipRepositoryError::persistence)?;
        Ok(state.roles.iter().find(|role| role.id() == id).copied())
    }
}
