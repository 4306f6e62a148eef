//! Derived project read model.

use super::Project;
use crate::membership::domain::Member;
use crate::task::domain::TaskStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project together with live membership and task counts.
///
/// Built from store queries on every read; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOverview {
    /// The project record.
    pub project: Project,
    /// Current members ordered by enrollment time.
    pub members: Vec<Member>,
    /// Number of tasks in the project.
    pub task_count: u64,
    /// Number of members in the project.
    pub member_count: u64,
    /// Task counts per status. Statuses without tasks are omitted.
    pub tasks_by_status: BTreeMap<TaskStatus, u64>,
}
