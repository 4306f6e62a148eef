//! Task lifecycle management.
//!
//! The lifecycle engine creates, patches, assigns, re-statuses and deletes
//! tasks. Each mutation is authorized against the actor's project role,
//! recorded in the history ledger, and may emit notifications:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
