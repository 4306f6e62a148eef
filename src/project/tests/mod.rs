//! Unit tests for projects and the project overview.

mod service_tests;
