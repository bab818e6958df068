//! Solo Odds - live hashrate telemetry and solo-mining odds
//!
//! This crate watches a local miner and answers "how likely am I to find a
//! block on my own?":
//! - Hashrate from the miner's status API, its log file, or a synthetic generator
//! - Global difficulty and block height from public endpoints
//! - Poisson expected-time and window odds, formatted for humans
//! - A five-minute display series and a JSON stats endpoint

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Hashrate source adapters
pub mod source;

/// Network difficulty and height fetching
pub mod network;

/// Odds model, display series and the shared snapshot
pub mod stats;

/// Background producer tasks and their supervisor
pub mod monitor;

/// HTTP stats endpoint and dashboard
pub mod web;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use monitor::Monitor;
pub use network::{NetworkStats, NetworkStatsFetcher};
pub use source::{HashrateSource, build_source};
pub use stats::{Estimate, SlidingWindowSeries, StatsReporter, StatsSnapshot};
pub use types::{HashrateSample, SampleSource, SourceMode};
pub use utils::{TelemetryError, init_logging};
