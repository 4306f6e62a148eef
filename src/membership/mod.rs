//! Role-based project membership.
//!
//! The registry enrolls users in projects with a seeded role and answers the
//! authorization question every other service asks before mutating project
//! data:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Registry and access checks in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
