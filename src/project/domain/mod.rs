//! Domain model for projects.

mod error;
mod ids;
mod overview;
mod project;

pub use error::ProjectDomainError;
pub use ids::ProjectId;
pub use overview::ProjectOverview;
pub use project::{PersistedProjectData, Project, ProjectName, ProjectPatch};
