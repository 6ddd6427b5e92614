//! CLI integration tests.

mod batch_tests;
mod common;
mod run_tests;
mod state_tests;
