//! Seeded role catalog and the authorization policy attached to it.

use super::{MembershipDomainError, ProjectAction, RoleId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a seeded project role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    /// Manages the project, its members and every task.
    Admin,
    /// Creates and edits tasks.
    Member,
    /// Read-only access.
    Observer,
    /// Creates and edits tasks.
    Developer,
}

impl RoleName {
    /// Every seeded role in catalog order.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Member, Self::Observer, Self::Developer];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
            Self::Observer => "OBSERVER",
            Self::Developer => "DEVELOPER",
        }
    }

    /// Returns the seeded identifier for this role.
    #[must_use]
    pub const fn id(self) -> RoleId {
        match self {
            Self::Admin => RoleId::new(1),
            Self::Member => RoleId::new(2),
            Self::Observer => RoleId::new(3),
            Self::Developer => RoleId::new(4),
        }
    }

    /// Resolves a seeded role from its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipDomainError::UnknownRoleId`] for identifiers
    /// outside the catalog.
    pub fn from_id(id: RoleId) -> Result<Self, MembershipDomainError> {
        Self::ALL
            .into_iter()
            .find(|role| role.id() == id)
            .ok_or(MembershipDomainError::UnknownRoleId(id.value()))
    }

    /// Returns `true` when holders of this role may perform `action`.
    #[must_use]
    pub const fn permits(self, action: ProjectAction) -> bool {
        match self {
            Self::Admin => true,
            Self::Member | Self::Developer => matches!(
                action,
                ProjectAction::ViewProject | ProjectAction::CreateTask | ProjectAction::EditTask
            ),
            Self::Observer => matches!(action, ProjectAction::ViewProject),
        }
    }
}

impl TryFrom<&str> for RoleName {
    type Error = MembershipDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ADMIN" => Ok(Self::Admin),
            "MEMBER" => Ok(Self::Member),
            "OBSERVER" => Ok(Self::Observer),
            "DEVELOPER" => Ok(Self::Developer),
            _ => Err(MembershipDomainError::UnknownRole(value.to_owned())),
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry pairing a role identifier with its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: RoleName,
}

impl Role {
    /// Returns the catalog entry for a seeded role.
    #[must_use]
    pub const fn seeded(name: RoleName) -> Self {
        Self { id: name.id(), name }
    }

    /// Returns the full seed catalog.
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        RoleName::ALL.into_iter().map(Self::seeded).collect()
    }

    /// Returns the role identifier.
    #[must_use]
    pub const fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub const fn name(&self) -> RoleName {
        self.name
    }
}
