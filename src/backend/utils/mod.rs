//! Utility modules shared by the fetcher and the server.

/// Configuration for fetch runs and the development server.
pub mod config;
/// File system operations and utilities.
pub mod file_utils;
/// Size formatting.
pub mod formater;
