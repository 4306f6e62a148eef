//! In-memory store integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `project_scenario_tests`: End-to-end project and task workflows
//! - `cascade_tests`: Deletion cascades and dependent-record guards
//! - `concurrency_tests`: Parallel mutations against one shared store

mod test_helpers;

mod in_memory {
    pub mod helpers;

    mod cascade_tests;
    mod concurrency_tests;
    mod project_scenario_tests;
}
