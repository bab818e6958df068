// src/utils/mod.rs
//! Utilities module for common functionality
//!
//! Error handling and logging infrastructure shared by every producer and
//! consumer in the service.

/// Error types and handling utilities
///
/// Contains the [`TelemetryError`] enum which defines all internal error
/// conditions, along with conversion implementations.
pub mod error;

/// Logging configuration and utilities
pub mod logging;

// Re-export for easier access
pub use error::TelemetryError;
pub use logging::init_logging;

/// Current wall-clock time as fractional seconds since the Unix epoch
///
/// Falls back to 0.0 if the system clock is set before the epoch.
pub fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
