//! Services built on top of the fetcher.

/// Console output for setup runs.
pub mod report;
/// Orchestration of a full asset setup.
pub mod setup;

pub use report::ConsoleReporter;
pub use setup::{SetupProgress, SetupReport, Silent, run_setup};
