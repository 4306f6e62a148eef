//! Notification type tags and related-entity references.

use super::NotificationDomainError;
use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

const TASK_ASSIGNED: &str = "TASK_ASSIGNED";
const TASK_STATUS_CHANGED: &str = "TASK_STATUS_CHANGED";
const PROJECT_MEMBER_ADDED: &str = "PROJECT_MEMBER_ADDED";

/// Upper snake case tag classifying a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationType(String);

impl NotificationType {
    /// Creates a validated type tag.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::InvalidType`] unless the value is
    /// non-blank, starts with an uppercase letter, and contains only
    /// uppercase letters, digits and underscores.
    pub fn new(value: impl Into<String>) -> Result<Self, NotificationDomainError> {
        let raw = value.into();
        let starts_with_letter = raw.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        let is_upper_snake = raw
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !starts_with_letter || !is_upper_snake {
            return Err(NotificationDomainError::InvalidType(raw));
        }
        Ok(Self(raw))
    }

    /// Tag for task assignment events.
    #[must_use]
    pub fn task_assigned() -> Self {
        Self(TASK_ASSIGNED.to_owned())
    }

    /// Tag for task status change events.
    #[must_use]
    pub fn task_status_changed() -> Self {
        Self(TASK_STATUS_CHANGED.to_owned())
    }

    /// Tag for project enrollment events.
    #[must_use]
    pub fn project_member_added() -> Self {
        Self(PROJECT_MEMBER_ADDED.to_owned())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entity a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelatedEntity {
    /// A project.
    Project(ProjectId),
    /// A task.
    Task(TaskId),
}

impl RelatedEntity {
    /// Returns the storage tag of the referenced entity kind.
    #[must_use]
    pub const fn entity_type(self) -> &'static str {
        match self {
            Self::Project(_) => "PROJECT",
            Self::Task(_) => "TASK",
        }
    }

    /// Returns the referenced identifier.
    #[must_use]
    pub const fn entity_id(self) -> uuid::Uuid {
        match self {
            Self::Project(id) => id.into_inner(),
            Self::Task(id) => id.into_inner(),
        }
    }

    /// Rebuilds a reference from its storage tag and identifier.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::UnknownEntityType`] for tags other
    /// than `PROJECT` and `TASK`.
    pub fn from_parts(
        entity_type: &str,
        entity_id: uuid::Uuid,
    ) -> Result<Self, NotificationDomainError> {
        match entity_type {
            "PROJECT" => Ok(Self::Project(ProjectId::from_uuid(entity_id))),
            "TASK" => Ok(Self::Task(TaskId::from_uuid(entity_id))),
            other => Err(NotificationDomainError::UnknownEntityType(other.to_owned())),
        }
    }
}
