//! Projects and the member-management facade over them.
//!
//! Creating a project enrolls its creator as `ADMIN` in the same store call.
//! Reads return a [`domain::ProjectOverview`] whose counts are recomputed
//! from the store every time.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
