//! Unit tests for the history ledger.

mod service_tests;
