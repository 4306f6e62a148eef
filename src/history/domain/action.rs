//! Actions recorded in the task history.

use super::HistoryDomainError;
use crate::task::domain::TaskChange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    /// The task was created.
    Created,
    /// The title changed.
    TitleChanged,
    /// The description changed.
    DescriptionChanged,
    /// The status changed.
    StatusChanged,
    /// The priority changed.
    PriorityChanged,
    /// The due date changed.
    DueDateChanged,
    /// The assignee changed.
    Assigned,
    /// The task was deleted.
    Deleted,
}

impl HistoryAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::TitleChanged => "TITLE_CHANGED",
            Self::DescriptionChanged => "DESCRIPTION_CHANGED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::PriorityChanged => "PRIORITY_CHANGED",
            Self::DueDateChanged => "DUE_DATE_CHANGED",
            Self::Assigned => "ASSIGNED",
            Self::Deleted => "DELETED",
        }
    }

    /// Parses a canonical action name. Matching is case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryDomainError::UnknownAction`] for any other value.
    pub fn parse(value: &str) -> Result<Self, HistoryDomainError> {
        Self::try_from(value)
    }

    /// Returns the action that records `change`.
    #[must_use]
    pub const fn for_change(change: &TaskChange) -> Self {
        match change {
            TaskChange::Title { .. } => Self::TitleChanged,
            TaskChange::Description { .. } => Self::DescriptionChanged,
            TaskChange::Status { .. } => Self::StatusChanged,
            TaskChange::Priority { .. } => Self::PriorityChanged,
            TaskChange::DueDate { .. } => Self::DueDateChanged,
            TaskChange::Assignee { .. } => Self::Assigned,
        }
    }
}

impl TryFrom<&str> for HistoryAction {
    type Error = HistoryDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CREATED" => Ok(Self::Created),
            "TITLE_CHANGED" => Ok(Self::TitleChanged),
            "DESCRIPTION_CHANGED" => Ok(Self::DescriptionChanged),
            "STATUS_CHANGED" => Ok(Self::StatusChanged),
            "PRIORITY_CHANGED" => Ok(Self::PriorityChanged),
            "DUE_DATE_CHANGED" => Ok(Self::DueDateChanged),
            "ASSIGNED" => Ok(Self::Assigned),
            "DELETED" => Ok(Self::Deleted),
            _ => Err(HistoryDomainError::UnknownAction(value.to_owned())),
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
