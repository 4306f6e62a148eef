//! Domain model for notification records.

mod error;
mod ids;
mod kind;
mod notification;

pub use error::NotificationDomainError;
pub use ids::NotificationId;
pub use kind::{NotificationType, RelatedEntity};
pub use notification::{NewNotification, Notification, PersistedNotificationData};
