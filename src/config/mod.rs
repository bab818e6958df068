// src/config/mod.rs
//! Configuration management for the telemetry service
//!
//! Handles loading the optional TOML configuration file, layering
//! environment overrides on top, and generating a commented template.

/// Core configuration implementation
///
/// Contains the [`Config`] struct with its defaults, overrides and checks.
pub mod config;

// Re-export key items for easy access
pub use config::Config;

use crate::utils::error::TelemetryError;
use std::path::PathBuf;

/// Builds the effective configuration
///
/// # Arguments
/// * `path` - Optional TOML file; defaults are used when absent
///
/// # Returns
/// * `Ok(Config)` - Defaults, file and environment merged and validated
/// * `Err(TelemetryError)` - If the file couldn't be read or a value is invalid
pub fn load(path: Option<impl Into<PathBuf>>) -> Result<Config, TelemetryError> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

/// Generates a commented configuration template
pub fn generate_template() -> String {
    Config::generate_template()
}
