//! Unit tests for roles, memberships and authorization.
