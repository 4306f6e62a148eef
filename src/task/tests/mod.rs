//! Unit tests for the task lifecycle.

mod atomicity_tests;
