//! User directory.
//!
//! Registration, lookup, credential replacement and guarded deletion of the
//! identities that own projects, tasks, memberships and notifications:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
