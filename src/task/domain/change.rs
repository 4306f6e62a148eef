//! Field-level changes produced by task mutations.

use super::{TaskPriority, TaskStatus, TaskTitle};
use crate::user::domain::UserId;
use chrono::NaiveDate;

/// One field change applied to a task, with its previous and new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// The title changed.
    Title {
        /// Previous title.
        old: TaskTitle,
        /// New title.
        new: TaskTitle,
    },
    /// The description was set, replaced or cleared.
    Description {
        /// Previous description.
        old: Option<String>,
        /// New description.
        new: Option<String>,
    },
    /// The status changed.
    Status {
        /// Previous status.
        old: TaskStatus,
        /// New status.
        new: TaskStatus,
    },
    /// The priority changed.
    Priority {
        /// Previous priority.
        old: TaskPriority,
        /// New priority.
        new: TaskPriority,
    },
    /// The due date was set, moved or cleared.
    DueDate {
        /// Previous due date.
        old: Option<NaiveDate>,
        /// New due date.
        new: Option<NaiveDate>,
    },
    /// The assignee was set, replaced or cleared.
    Assignee {
        /// Previous assignee.
        old: Option<UserId>,
        /// New assignee.
        new: Option<UserId>,
    },
}
