// src/cli/mod.rs
/// Argument definitions
pub mod commands;

pub use commands::{Action, Commands, ConfigOptions, ProbeOptions, StartOptions};
