//! Append-only audit trail of task changes.
//!
//! The task lifecycle engine writes entries as part of every mutation; the
//! ledger service here answers queries and records ad hoc entries.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
