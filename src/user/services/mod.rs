//! Application services for the user directory.

mod directory;

pub use directory::{RegisterUserRequest, UserDirectoryService, UserServiceError, UserServiceResult};
