//! Application services for notifications.

mod emitter;

pub use emitter::{
    NotificationEmitterService, NotificationServiceError, NotificationServiceResult,
    NotifyRequest,
};
