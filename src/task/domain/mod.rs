//! Domain model for the task lifecycle.
//!
//! Tasks belong to exactly one project. Every mutation reports the fields
//! it changed as [`TaskChange`] values so callers can record history
//! without diffing snapshots.

mod change;
mod error;
mod ids;
mod status;
mod task;

pub use change::TaskChange;
pub use error::TaskDomainError;
pub use ids::TaskId;
pub use status::{TaskPriority, TaskStatus};
pub use task::{NewTaskData, PersistedTaskData, Task, TaskPatch, TaskTitle};
