// src/stats/series.rs
//! Five-minute display series
//!
//! Only feeds what gets plotted and shown as the "display" hashrate; odds are
//! always computed from the measured value.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;

/// How far back the series reaches, in seconds
pub const WINDOW_SECS: f64 = 300.0;

/// Weight of the previously plotted value when smoothing fallback values
const SMOOTHING_PREV: f64 = 0.7;

/// One plotted point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    /// Wall-clock seconds since the Unix epoch
    pub timestamp: f64,
    /// Hashrate to display, H/s
    pub display_value_hz: f64,
}

/// Bounded, time-ordered display series with a fallback policy for gaps
///
/// Owned by the hashrate producer; nothing else mutates it.
#[derive(Debug)]
pub struct SlidingWindowSeries {
    points: VecDeque<TimeSeriesPoint>,
    baseline_hz: f64,
    jitter_pct: f64,
    show_when_zero: bool,
    rng: StdRng,
}

impl SlidingWindowSeries {
    /// Creates an empty series
    ///
    /// # Arguments
    /// * `baseline_hz` - Value plotted while the miner reports nothing
    /// * `jitter_pct` - Relative jitter applied to the baseline (0.06 = ±6%)
    /// * `show_when_zero` - Plot the baseline instead of 0 during gaps
    pub fn new(baseline_hz: f64, jitter_pct: f64, show_when_zero: bool) -> Self {
        Self::with_rng(baseline_hz, jitter_pct, show_when_zero, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with a fixed jitter seed
    pub fn seeded(baseline_hz: f64, jitter_pct: f64, show_when_zero: bool, seed: u64) -> Self {
        Self::with_rng(baseline_hz, jitter_pct, show_when_zero, StdRng::seed_from_u64(seed))
    }

    fn with_rng(baseline_hz: f64, jitter_pct: f64, show_when_zero: bool, rng: StdRng) -> Self {
        SlidingWindowSeries {
            points: VecDeque::new(),
            baseline_hz: baseline_hz.max(0.0),
            jitter_pct,
            show_when_zero,
            rng,
        }
    }

    /// Records one measurement and returns the value plotted for it
    ///
    /// A positive measurement is stored as is. Otherwise the baseline (or 0
    /// when the fallback is disabled) is jittered and blended 70/30 with the
    /// previous point so the line does not jump around. Points older than
    /// [`WINDOW_SECS`] before `now` are then dropped; a point exactly at the
    /// cutoff is kept.
    pub fn tick(&mut self, now: f64, measured_hz: f64) -> f64 {
        let value = if measured_hz > 0.0 && measured_hz.is_finite() {
            measured_hz
        } else {
            let base = if self.show_when_zero {
                self.baseline_hz
            } else {
                0.0
            };
            self.jitter(base)
        };

        self.points.push_back(TimeSeriesPoint {
            timestamp: now,
            display_value_hz: value,
        });
        self.prune(now);
        value
    }

    fn jitter(&mut self, value: f64) -> f64 {
        if value <= 0.0 || self.jitter_pct <= 0.0 {
            return value;
        }
        let pct = self.jitter_pct;
        let mut jittered = value * (1.0 + self.rng.gen_range(-pct..=pct));
        if let Some(prev) = self.latest() {
            jittered = SMOOTHING_PREV * prev + (1.0 - SMOOTHING_PREV) * jittered;
        }
        jittered.max(0.0)
    }

    fn prune(&mut self, now: f64) {
        let cutoff = now - WINDOW_SECS;
        while self.points.front().is_some_and(|p| p.timestamp < cutoff) {
            self.points.pop_front();
        }
    }

    /// Most recently plotted value
    pub fn latest(&self) -> Option<f64> {
        self.points.back().map(|p| p.display_value_hz)
    }

    /// Points currently in the window, oldest first
    pub fn points(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.iter()
    }

    /// Number of points in the window
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(series: &SlidingWindowSeries) -> Vec<f64> {
        series.points().map(|p| p.timestamp).collect()
    }

    #[test]
    fn test_eviction_relative_to_latest_insert() {
        let mut series = SlidingWindowSeries::seeded(250e3, 0.06, true, 7);
        for t in [0.0, 100.0, 200.0, 400.0] {
            series.tick(t, 1000.0);
        }
        assert_eq!(timestamps(&series), vec![100.0, 200.0, 400.0]);

        series.tick(450.0, 1000.0);
        assert_eq!(timestamps(&series), vec![200.0, 400.0, 450.0]);

        series.tick(1000.0, 1000.0);
        assert_eq!(timestamps(&series), vec![1000.0]);
    }

    #[test]
    fn test_point_at_cutoff_is_kept() {
        let mut series = SlidingWindowSeries::seeded(0.0, 0.0, false, 1);
        series.tick(0.0, 5.0);
        series.tick(300.0, 5.0);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_real_measurement_is_not_smoothed() {
        let mut series = SlidingWindowSeries::seeded(250e3, 0.06, true, 3);
        series.tick(0.0, 0.0);
        assert_eq!(series.tick(1.0, 123_456.0), 123_456.0);
        assert_eq!(series.latest(), Some(123_456.0));
    }

    #[test]
    fn test_fallback_disabled_plots_zero() {
        let mut series = SlidingWindowSeries::seeded(250e3, 0.06, false, 3);
        assert_eq!(series.tick(0.0, 0.0), 0.0);
        series.tick(1.0, 1e6);
        // previous value does not leak into a disabled fallback
        assert_eq!(series.tick(2.0, 0.0), 0.0);
    }

    #[test]
    fn test_fallback_jitter_is_bounded() {
        let base = 250e3;
        let pct = 0.06;
        let mut series = SlidingWindowSeries::seeded(base, pct, true, 42);
        for t in 0..600 {
            let v = series.tick(t as f64, 0.0);
            assert!(
                v >= base * (1.0 - pct) - 1e-6 && v <= base * (1.0 + pct) + 1e-6,
                "{} out of band",
                v
            );
        }
        assert!(series.len() <= 301);
    }

    #[test]
    fn test_fallback_is_smoothed_against_previous() {
        let mut series = SlidingWindowSeries::seeded(250e3, 0.5, true, 9);
        series.tick(0.0, 1e6);
        let v = series.tick(1.0, 0.0);
        // 0.7 * 1e6 + 0.3 * [125e3, 375e3]
        assert!(v >= 700e3 + 0.3 * 125e3 - 1e-6);
        assert!(v <= 700e3 + 0.3 * 375e3 + 1e-6);
    }

    #[test]
    fn test_no_jitter_returns_baseline() {
        let mut series = SlidingWindowSeries::seeded(250e3, 0.0, true, 9);
        assert_eq!(series.tick(0.0, f64::NAN), 250e3);
    }
}
