//! Utility functions and helpers
//!
//! Application paths, tracing setup and pt-BR value formatting.

pub mod app_paths;
pub mod format;
pub mod logging;
