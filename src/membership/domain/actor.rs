//! Principals performing mutations and the actions they are checked against.

use crate::user::domain::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Principal performing a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    /// A registered user acting through a project role.
    User(UserId),
    /// Internal automation; bypasses project authorization.
    System,
}

impl Actor {
    /// Returns the acting user, or `None` for the system actor.
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::User(user_id) => Some(user_id),
            Self::System => None,
        }
    }
}

impl From<UserId> for Actor {
    fn from(user_id: UserId) -> Self {
        Self::User(user_id)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user_id) => write!(f, "user {user_id}"),
            Self::System => f.write_str("system"),
        }
    }
}

/// Project-scoped operation gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectAction {
    /// Read project data.
    ViewProject,
    /// Change project fields.
    EditProject,
    /// Delete the project.
    DeleteProject,
    /// Add, remove or re-role members.
    ManageMembers,
    /// Create tasks in the project.
    CreateTask,
    /// Change, assign or re-status tasks.
    EditTask,
    /// Delete tasks.
    DeleteTask,
}

impl ProjectAction {
    /// Returns the canonical representation used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewProject => "VIEW_PROJECT",
            Self::EditProject => "EDIT_PROJECT",
            Self::DeleteProject => "DELETE_PROJECT",
            Self::ManageMembers => "MANAGE_MEMBERS",
            Self::CreateTask => "CREATE_TASK",
            Self::EditTask => "EDIT_TASK",
            Self::DeleteTask => "DELETE_TASK",
        }
    }
}

impl fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
