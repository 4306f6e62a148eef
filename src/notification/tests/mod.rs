//! Unit tests for notifications.

mod service_tests;
