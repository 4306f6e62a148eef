//! Domain model for the append-only task history.

mod action;
mod entry;
mod error;
mod ids;

pub use action::HistoryAction;
pub use entry::{HistoryEntry, NewHistoryEntry, PersistedHistoryEntryData};
pub use error::HistoryDomainError;
pub use ids::HistoryEntryId;
