// src/stats/probability.rs
//! Expected-time and success-probability model
//!
//! Block discovery is treated as a Poisson process: at difficulty `d` a
//! block needs on average `d * 2^32` hashes, so a miner running at `h` H/s
//! waits `d * 2^32 / h` seconds on average. All functions here are pure.

use crate::stats::format::human_probability;
use serde::Serialize;

/// Size of the nonce space, hashes per difficulty-1 share
pub const NONCE_SPACE: f64 = 4_294_967_296.0;

/// Target block interval used to derive the network hashrate
pub const BLOCK_INTERVAL_SECS: f64 = 600.0;

/// Seconds in one day
pub const ONE_DAY_SECS: f64 = 86_400.0;

/// Seconds in one (365-day) year
pub const ONE_YEAR_SECS: f64 = 365.0 * ONE_DAY_SECS;

/// Below this expected-event count `1 - exp(-lam)` loses precision, so the
/// linear approximation is returned instead.
const LINEAR_REGIME: f64 = 1e-6;

/// The named windows published in the snapshot's `odds` map
pub const STANDARD_WINDOWS: [(&str, f64); 3] = [
    ("one_day", ONE_DAY_SECS),
    ("one_year", ONE_YEAR_SECS),
    ("ten_years", 10.0 * ONE_YEAR_SECS),
];

/// Probability of finding at least one block within a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityWindow {
    /// Window length in seconds
    pub duration_seconds: f64,
    /// Probability in [0, 1]
    pub probability: f64,
    /// Formatted probability, see [`human_probability`]
    pub human_text: String,
}

/// Total network hashrate implied by a difficulty
///
/// The network as a whole finds one block per ~10 minutes.
pub fn network_hashrate_hz(difficulty: f64) -> f64 {
    difficulty * NONCE_SPACE / BLOCK_INTERVAL_SECS
}

/// Mean time to find a block
///
/// # Returns
/// `f64::INFINITY` if the hashrate is not positive or the difficulty is
/// absent or not positive, otherwise `difficulty * 2^32 / hashrate_hz`.
pub fn expected_time_seconds(hashrate_hz: f64, difficulty: Option<f64>) -> f64 {
    match difficulty {
        Some(d) if hashrate_hz > 0.0 && d > 0.0 => d * NONCE_SPACE / hashrate_hz,
        _ => f64::INFINITY,
    }
}

/// Probability of at least one block within `window_seconds`
///
/// Monotonically increasing in both the window and the hashrate, and
/// bounded by 1. Returns 0 when the expected time is undefined.
pub fn probability_in_window(hashrate_hz: f64, difficulty: Option<f64>, window_seconds: f64) -> f64 {
    let t = expected_time_seconds(hashrate_hz, difficulty);
    if !t.is_finite() || t <= 0.0 || !window_seconds.is_finite() || window_seconds <= 0.0 {
        return 0.0;
    }

    let lam = window_seconds / t;
    if lam < LINEAR_REGIME {
        lam
    } else {
        // -expm1(-lam) == 1 - exp(-lam), without the cancellation
        (-(-lam).exp_m1()).min(1.0)
    }
}

/// Builds one [`ProbabilityWindow`]
pub fn probability_window(
    hashrate_hz: f64,
    difficulty: Option<f64>,
    window_seconds: f64,
) -> ProbabilityWindow {
    let probability = probability_in_window(hashrate_hz, difficulty, window_seconds);
    ProbabilityWindow {
        duration_seconds: window_seconds,
        probability,
        human_text: human_probability(probability),
    }
}

/// Computes every entry of [`STANDARD_WINDOWS`]
pub fn odds_table(hashrate_hz: f64, difficulty: Option<f64>) -> Vec<(&'static str, ProbabilityWindow)> {
    STANDARD_WINDOWS
        .iter()
        .map(|&(name, secs)| (name, probability_window(hashrate_hz, difficulty, secs)))
        .collect()
}
