//! Application services for projects.

mod management;

pub use management::{
    CreateProjectRequest, ProjectManagementService, ProjectServiceError, ProjectServiceResult,
    UpdateProjectRequest,
};
