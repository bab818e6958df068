// src/stats/reporter.rs
use crate::config::Config;
use crate::stats::format::{PLACEHOLDER, human_duration, human_hashrate};
use crate::stats::probability::{expected_time_seconds, odds_table};
use crate::stats::snapshot::{StatsSnapshot, StatsState, StatsUpdate};
use crate::types::SampleSource;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Hashrate the estimates are computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveHashrate {
    /// Hashes per second
    pub hz: f64,
    /// `Fallback` when the baseline stands in for a silent miner
    pub source: SampleSource,
}

/// Picks the hashrate used for odds
///
/// The measured value when positive. Otherwise the baseline if
/// `show_odds_when_zero` is set, or 0 (no estimate).
pub fn effective_hashrate(measured_hz: f64, source: SampleSource, config: &Config) -> EffectiveHashrate {
    if measured_hz > 0.0 {
        EffectiveHashrate { hz: measured_hz, source }
    } else if config.show_odds_when_zero {
        EffectiveHashrate {
            hz: config.baseline_hz(),
            source: SampleSource::Fallback,
        }
    } else {
        EffectiveHashrate { hz: 0.0, source }
    }
}

/// Derived estimate for one refresh
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    /// Hashrate the estimate is based on
    pub hashrate: EffectiveHashrate,
    /// Expected seconds to a block; `None` without difficulty or hashrate
    pub expected_seconds: Option<f64>,
    /// Formatted odds by window name
    pub odds: BTreeMap<String, String>,
}

impl Estimate {
    /// Computes expected time and odds
    pub fn compute(hashrate: EffectiveHashrate, difficulty: Option<f64>) -> Self {
        let t = expected_time_seconds(hashrate.hz, difficulty);
        if !t.is_finite() {
            return Estimate {
                hashrate,
                expected_seconds: None,
                odds: BTreeMap::new(),
            };
        }

        let odds = odds_table(hashrate.hz, difficulty)
            .into_iter()
            .map(|(name, window)| (name.to_string(), window.human_text))
            .collect();

        Estimate {
            hashrate,
            expected_seconds: Some(t),
            odds,
        }
    }

    /// Snapshot fields carrying this estimate
    pub fn to_update(&self) -> StatsUpdate {
        StatsUpdate::new().estimate(
            self.expected_seconds,
            self.expected_seconds.map(human_duration),
            self.odds.clone(),
        )
    }
}

/// Turns the latest producer outputs into published estimates
///
/// Driven by the refresh tick. Reads the snapshot, derives expected time and
/// odds from whatever is latest, and writes the estimate fields back.
pub struct StatsReporter {
    snapshot: Arc<StatsSnapshot>,
    config: Config,
    /// Kind of the configured hashrate source
    source_kind: SampleSource,
}

impl StatsReporter {
    /// Creates a reporter over `snapshot`
    pub fn new(snapshot: Arc<StatsSnapshot>, config: Config, source_kind: SampleSource) -> Self {
        StatsReporter {
            snapshot,
            config,
            source_kind,
        }
    }

    /// Recomputes and publishes the estimate
    ///
    /// # Returns
    /// The state the estimate was derived from, and the estimate itself
    pub fn refresh(&self) -> (StatsState, Estimate) {
        let state = self.snapshot.state();
        let hashrate = effective_hashrate(state.hashrate_hps, self.source_kind, &self.config);
        let estimate = Estimate::compute(hashrate, state.difficulty);
        self.snapshot.update(estimate.to_update());
        (state, estimate)
    }

    /// Logs a one-line summary of the state and estimate
    pub fn log_summary(&self, state: &StatsState, estimate: &Estimate) {
        let odds_1y = estimate
            .odds
            .get("one_year")
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER);
        let temp = state
            .cpu_temp_c
            .map(|t| format!("{:.1}°C", t))
            .unwrap_or_else(|| "n/a".into());
        let fallback = if estimate.hashrate.source == SampleSource::Fallback {
            " (odds on baseline)"
        } else {
            ""
        };

        log::info!(
            "Hashrate: {} [{}] | Height: {} | Expected: {}{} | 1y odds: {} | Temp: {}",
            human_hashrate(state.display_hashrate_hps),
            state.source,
            state
                .height
                .map(|h| h.to_string())
                .unwrap_or_else(|| "n/a".into()),
            estimate
                .expected_seconds
                .map(human_duration)
                .unwrap_or_else(|| PLACEHOLDER.into()),
            fallback,
            odds_1y,
            temp
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(show_odds_when_zero: bool) -> Config {
        Config {
            show_odds_when_zero,
            synthetic_base_khs: 250.0,
            ..Config::default()
        }
    }

    #[test]
    fn test_effective_hashrate_prefers_measurement() {
        let eff = effective_hashrate(1e6, SampleSource::LogTail, &config(true));
        assert_eq!(eff.hz, 1e6);
        assert_eq!(eff.source, SampleSource::LogTail);
    }

    #[test]
    fn test_effective_hashrate_fallback() {
        let eff = effective_hashrate(0.0, SampleSource::DaemonApi, &config(true));
        assert_eq!(eff.hz, 250e3);
        assert_eq!(eff.source, SampleSource::Fallback);

        let eff = effective_hashrate(0.0, SampleSource::DaemonApi, &config(false));
        assert_eq!(eff.hz, 0.0);
    }

    #[test]
    fn test_refresh_without_difficulty_publishes_nothing() {
        let snapshot = Arc::new(StatsSnapshot::new());
        snapshot.update(StatsUpdate::new().hashrate(1e6, 1e6, "Miner API"));
        let reporter = StatsReporter::new(snapshot.clone(), config(true), SampleSource::DaemonApi);

        let (_, estimate) = reporter.refresh();
        assert!(estimate.expected_seconds.is_none());
        let state = snapshot.state();
        assert!(state.expected_seconds.is_none());
        assert!(state.expected_human.is_none());
        assert!(state.odds.is_empty());
    }

    #[test]
    fn test_refresh_publishes_estimate() {
        let snapshot = Arc::new(StatsSnapshot::new());
        snapshot.update(StatsUpdate::new().network(Some(1e14), Some(850_000)));
        snapshot.update(StatsUpdate::new().hashrate(0.0, 0.0, "Miner API (no data)"));
        let reporter = StatsReporter::new(snapshot.clone(), config(true), SampleSource::DaemonApi);

        let (_, estimate) = reporter.refresh();
        assert_eq!(estimate.hashrate.source, SampleSource::Fallback);

        let state = snapshot.state();
        let expected = 1e14 * 4_294_967_296.0 / 250e3;
        assert_eq!(state.expected_seconds, Some(expected));
        assert!(state.expected_human.unwrap().ends_with(" years"));
        let keys: Vec<_> = state.odds.keys().cloned().collect();
        assert_eq!(keys, ["one_day", "one_year", "ten_years"]);
        assert!(state.odds["one_day"].starts_with("1 in "));
    }
}
