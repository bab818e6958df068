// src/utils/error.rs
use serde_json;
use std::io;
use thiserror::Error;
use url;

/// Main error type for the telemetry service
///
/// Producers never surface these to consumers. Adapters and the network
/// fetcher turn them into fallback values and status strings; only startup
/// failures (configuration, socket bind) travel up to `main`.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Errors related to network connectivity with the miner daemon
    #[error("Network connection error: {0}")]
    ConnectionError(String),

    /// A response or log line that could not be interpreted
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts TOML decoding errors into TelemetryError
///
/// Raised while loading the configuration file.
impl From<toml::de::Error> for TelemetryError {
    fn from(e: toml::de::Error) -> Self {
        TelemetryError::ConfigError(format!("Invalid config format: {}", e))
    }
}

/// Converts async task join errors into TelemetryError
///
/// Used when a blocking adapter poll or a producer task panics or is
/// aborted. Wraps the original error in a `TaskError` variant.
impl From<tokio::task::JoinError> for TelemetryError {
    fn from(e: tokio::task::JoinError) -> Self {
        TelemetryError::TaskError(format!("Async task failed: {}", e))
    }
}

impl From<std::num::ParseFloatError> for TelemetryError {
    fn from(e: std::num::ParseFloatError) -> Self {
        TelemetryError::ParseError(format!("not a number: {}", e))
    }
}

impl From<std::num::ParseIntError> for TelemetryError {
    fn from(e: std::num::ParseIntError) -> Self {
        TelemetryError::ParseError(format!("not an integer: {}", e))
    }
}
