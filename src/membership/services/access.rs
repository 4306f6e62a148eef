//! Project authorization checks shared by every mutating service.

use crate::error::ErrorKind;
use crate::membership::{
    domain::{Actor, Member, ProjectAction, RoleName},
    ports::{MembershipRepository, MembershipRepositoryError},
};
use crate::project::domain::ProjectId;
use crate::user::domain::UserId;
use thiserror::Error;
use tracing::warn;

/// Authorization failures.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The acting user holds no membership in the project.
    #[error("user {user_id} is not a member of project {project_id} and cannot {action}")]
    NotAMember {
        /// Project the action targeted.
        project_id: ProjectId,
        /// Acting user.
        user_id: UserId,
        /// Rejected action.
        action: ProjectAction,
    },
    /// The acting user's role does not permit the action.
    #[error("role {role} in project {project_id} does not permit {action}")]
    Denied {
        /// Project the action targeted.
        project_id: ProjectId,
        /// Acting user.
        user_id: UserId,
        /// Role held by the acting user.
        role: RoleName,
        /// Rejected action.
        action: ProjectAction,
    },
    /// Membership lookup failed.
    #[error(transparent)]
    Repository(#[from] MembershipRepositoryError),
}

impl AccessError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAMember { .. } | Self::Denied { .. } => ErrorKind::Forbidden,
            Self::Repository(_) => ErrorKind::Storage,
        }
    }
}

/// Checks that `actor` may perform `action` in `project_id`.
///
/// Returns the actor's membership, or `None` for [`Actor::System`]. The
/// membership is read on every call.
///
/// # Errors
///
/// Returns [`AccessError::NotAMember`] or [`AccessError::Denied`] when the
/// actor is not allowed, or [`AccessError::Repository`] when the lookup
/// fails.
pub async fn authorize<M>(
    members: &M,
    project_id: ProjectId,
    actor: Actor,
    action: ProjectAction,
) -> Result<Option<Member>, AccessError>
where
    M: MembershipRepository + ?Sized,
{
    let Actor::User(user_id) = actor else {
        return Ok(None);
    };

    let Some(member) = members.find(project_id, user_id).await? else {
        warn!(%project_id, %user_id, %action, "rejected action from non-member");
        return Err(AccessError::NotAMember {
            project_id,
            user_id,
            action,
        });
    };

    if !member.role().permits(action) {
        warn!(%project_id, %user_id, role = %member.role(), %action, "rejected action for role");
        return Err(AccessError::Denied {
            project_id,
            user_id,
            role: member.role(),
            action,
        });
    }

    Ok(Some(member))
}
