//! Statistics: the odds model, display series and the shared snapshot
//!
//! This module turns raw producer outputs into what consumers see:
//! - Expected time and probability-of-a-block estimates
//! - Human-readable formatting of durations, hashrates and odds
//! - The five-minute display series with its zero-hashrate fallback
//! - The mutex-guarded snapshot served as `/stats.json`
//! - CPU temperature reading
//!
//! The main shared component is [`StatsSnapshot`]; [`StatsReporter`] keeps
//! its derived fields current.

/// Human-readable formatters
pub mod format;

/// Poisson expected-time and window-probability model
pub mod probability;

/// Derives estimates from the snapshot on each refresh tick
pub mod reporter;

/// CPU temperature sensor
pub mod sensors;

/// Bounded display series
pub mod series;

/// Shared state store
///
/// One mutex guards the whole state; every update and every serialized
/// read happens under it.
pub mod snapshot;

// Re-export main components
pub use format::{human_duration, human_hashrate, human_probability};
pub use probability::{ProbabilityWindow, expected_time_seconds, probability_in_window};
pub use reporter::{Estimate, StatsReporter, effective_hashrate};
pub use sensors::CpuTempSensor;
pub use series::{SlidingWindowSeries, TimeSeriesPoint};
pub use snapshot::{StatsSnapshot, StatsState, StatsUpdate};
