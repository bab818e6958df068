// src/types.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the service reads the miner's hashrate from
///
/// Selected once at startup from configuration; each mode maps onto one
/// [`HashrateSource`](crate::source::HashrateSource) implementation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMode {
    /// Query the miner's text status API over TCP (cgminer/BFGMiner style)
    #[clap(name = "daemon-api")]
    DaemonApi,

    /// Tail the miner's log file and scrape reported rates (cpuminer style)
    #[clap(name = "log-tail")]
    LogTail,

    /// Pick a source automatically
    ///
    /// Currently resolves to the daemon API, the most common setup.
    #[clap(name = "auto")]
    Auto,

    /// Generate random readings around a configured baseline
    #[clap(name = "synthetic")]
    Synthetic,
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::DaemonApi => write!(f, "daemon-api"),
            SourceMode::LogTail => write!(f, "log-tail"),
            SourceMode::Auto => write!(f, "auto"),
            SourceMode::Synthetic => write!(f, "synthetic"),
        }
    }
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daemon-api" | "daemon" | "bfgminer" | "cgminer" => Ok(SourceMode::DaemonApi),
            "log-tail" | "log" | "cpuminer" => Ok(SourceMode::LogTail),
            "auto" => Ok(SourceMode::Auto),
            "synthetic" | "mock" => Ok(SourceMode::Synthetic),
            _ => Err(format!("Unknown source mode: {}", s)),
        }
    }
}

/// Kind of source a hashrate figure came from
///
/// Adapters stamp samples with their own kind; `Fallback` is never produced
/// by an adapter. It tags the effective rate the odds are computed from when
/// the configured baseline stands in for a miner reporting 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleSource {
    /// Miner daemon status API
    DaemonApi,
    /// Miner log file
    LogTail,
    /// Synthetic generator
    Synthetic,
    /// Baseline substituted for a silent miner; effective rates only
    Fallback,
}

/// One hashrate reading taken from a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashrateSample {
    /// Wall-clock seconds since the Unix epoch
    pub timestamp: f64,
    /// Hashes per second, never negative
    pub value_hz: f64,
    /// Source kind
    pub source: SampleSource,
    /// Human-readable source label, e.g. `"Miner API (no data)"`
    pub label: String,
}

impl HashrateSample {
    /// Builds a sample, clamping negative or NaN rates to zero
    pub fn new(timestamp: f64, value_hz: f64, source: SampleSource, label: String) -> Self {
        let value_hz = if value_hz.is_finite() && value_hz > 0.0 {
            value_hz
        } else {
            0.0
        };
        HashrateSample {
            timestamp,
            value_hz,
            source,
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_mode_parsing() {
        assert_eq!("daemon-api".parse::<SourceMode>(), Ok(SourceMode::DaemonApi));
        assert_eq!("BFGMiner".parse::<SourceMode>(), Ok(SourceMode::DaemonApi));
        assert_eq!("cpuminer".parse::<SourceMode>(), Ok(SourceMode::LogTail));
        assert_eq!("mock".parse::<SourceMode>(), Ok(SourceMode::Synthetic));
        assert_eq!(" auto ".parse::<SourceMode>(), Ok(SourceMode::Auto));
        assert!("gpu".parse::<SourceMode>().is_err());
    }

    #[test]
    fn test_source_mode_display_round_trips() {
        for mode in [
            SourceMode::DaemonApi,
            SourceMode::LogTail,
            SourceMode::Auto,
            SourceMode::Synthetic,
        ] {
            assert_eq!(mode.to_string().parse::<SourceMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_sample_clamps_invalid_rates() {
        let s = HashrateSample::new(1.0, -5.0, SampleSource::Synthetic, "Mock".into());
        assert_eq!(s.value_hz, 0.0);
        let s = HashrateSample::new(1.0, f64::NAN, SampleSource::Synthetic, "Mock".into());
        assert_eq!(s.value_hz, 0.0);
    }
}
