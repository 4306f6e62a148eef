//! Notification records produced by task and membership events.
//!
//! Notifications are stored for later delivery by an outer layer; nothing
//! here sends email or pushes messages.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
