//! PMT: project management core.
//!
//! This crate provides the domain model and application services for
//! collaborative project management: user accounts, projects with role-based
//! membership, tasks with a status and priority workflow, an append-only
//! change history, and per-user notifications.
//!
//! # Architecture
//!
//! PMT follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract repository traits for persistence
//! - **Services**: Orchestration over a [`store::Store`] bundle of ports
//! - **Adapters**: In-memory and `PostgreSQL` stores under [`store`]
//!
//! # Modules
//!
//! - [`user`]: Registration, lookup and guarded deletion of accounts
//! - [`project`]: Project lifecycle and the project overview
//! - [`membership`]: Roles, memberships and action authorization
//! - [`task`]: Task creation, updates, assignment and due-date queries
//! - [`history`]: Append-only ledger of task changes
//! - [`notification`]: Per-user notices emitted by lifecycle events

pub mod config;
pub mod error;
pub mod history;
pub mod membership;
pub mod notification;
pub mod patch;
pub mod project;
pub mod store;
pub mod task;
pub mod user;

#[cfg(test)]
mod test_support;
