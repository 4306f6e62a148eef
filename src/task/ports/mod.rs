//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

mod repository;

pub use repository::{TaskEffects, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
