//! Configuration module
//!
//! Application configuration (TOML) and the per-user display settings
//! persisted through the settings store.

pub mod config;
pub mod settings;
