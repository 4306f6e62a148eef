//! Storage adapters and the port bundle consumed by services.
//!
//! Services depend on [`Store`] rather than on individual repositories so a
//! single adapter can keep cross-aggregate routines (creator enrollment,
//! cascading deletes) inside one lock or one transaction.
//!
//! - [`memory`]: `RwLock`-guarded state for tests and embedded use
//! - [`postgres`]: Diesel adapters backed by an r2d2 pool

pub mod memory;
pub mod postgres;

use crate::history::ports::HistoryRepository;
use crate::membership::ports::{MembershipRepository, RoleCatalog};
use crate::notification::ports::NotificationRepository;
use crate::project::ports::ProjectRepository;
use crate::task::ports::TaskRepository;
use crate::user::ports::UserRepository;

/// Bundle of every persistence port used by the services.
pub trait Store: Send + Sync + 'static {
    /// User repository implementation.
    type Users: UserRepository;
    /// Project repository implementation.
    type Projects: ProjectRepository;
    /// Membership repository implementation.
    type Members: MembershipRepository;
    /// Role catalog implementation.
    type Roles: RoleCatalog;
    /// Task repository implementation.
    type Tasks: TaskRepository;
    /// History repository implementation.
    type History: HistoryRepository;
    /// Notification repository implementation.
    type Notifications: NotificationRepository;

    /// Returns the user repository.
    fn users(&self) -> &Self::Users;

    /// Returns the project repository.
    fn projects(&self) -> &Self::Projects;

    /// Returns the membership repository.
    fn members(&self) -> &Self::Members;

    /// Returns the role catalog.
    fn roles(&self) -> &Self::Roles;

    /// Returns the task repository.
    fn tasks(&self) -> &Self::Tasks;

    /// Returns the history repository.
    fn history(&self) -> &Self::History;

    /// Returns the notification repository.
    fn notifications(&self) -> &Self::Notifications;
}
