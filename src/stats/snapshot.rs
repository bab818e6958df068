// src/stats/snapshot.rs
//! Shared point-in-time state read by the HTTP surface and the refresh tick
//!
//! Each producer owns a group of fields and writes it with one
//! [`StatsSnapshot::update`] call. Groups from different producers are
//! independent: readers get the latest value of every field, not a joint
//! reading taken at one instant.

use crate::stats::probability::network_hashrate_hz;
use crate::utils::error::TelemetryError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Every published field, serialized as the `/stats.json` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsState {
    /// Time of the last update, ISO-8601 UTC
    pub time: Option<String>,
    /// Measured hashrate, H/s
    pub hashrate_hps: f64,
    /// Hashrate shown to users, H/s (fallback-smoothed when measured is 0)
    pub display_hashrate_hps: f64,
    /// Label of the source the measurement came from
    pub source: String,
    /// Latest known network difficulty
    pub difficulty: Option<f64>,
    /// Latest known block height
    pub height: Option<u64>,
    /// Network hashrate implied by the difficulty
    pub network_hps: Option<f64>,
    /// Expected seconds to find a block
    pub expected_seconds: Option<f64>,
    /// `expected_seconds`, human formatted
    pub expected_human: Option<String>,
    /// Formatted odds keyed by window name (`one_day`, `one_year`, `ten_years`)
    pub odds: BTreeMap<String, String>,
    /// CPU temperature in degrees Celsius
    pub cpu_temp_c: Option<f64>,
}

impl Default for StatsState {
    fn default() -> Self {
        StatsState {
            time: None,
            hashrate_hps: 0.0,
            display_hashrate_hps: 0.0,
            source: "Starting".into(),
            difficulty: None,
            height: None,
            network_hps: None,
            expected_seconds: None,
            expected_human: None,
            odds: BTreeMap::new(),
            cpu_temp_c: None,
        }
    }
}

/// A set of fields to merge into [`StatsState`]
///
/// Unset fields are left untouched by [`StatsSnapshot::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsUpdate {
    hashrate_hps: Option<f64>,
    display_hashrate_hps: Option<f64>,
    source: Option<String>,
    difficulty: Option<Option<f64>>,
    height: Option<Option<u64>>,
    network_hps: Option<Option<f64>>,
    expected_seconds: Option<Option<f64>>,
    expected_human: Option<Option<String>>,
    odds: Option<BTreeMap<String, String>>,
    cpu_temp_c: Option<Option<f64>>,
}

impl StatsUpdate {
    /// An empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashrate producer fields
    pub fn hashrate(mut self, measured_hps: f64, display_hps: f64, source: impl Into<String>) -> Self {
        self.hashrate_hps = Some(measured_hps);
        self.display_hashrate_hps = Some(display_hps);
        self.source = Some(source.into());
        self
    }

    /// Network producer fields; the network hashrate follows the difficulty
    pub fn network(mut self, difficulty: Option<f64>, height: Option<u64>) -> Self {
        self.difficulty = Some(difficulty);
        self.height = Some(height);
        self.network_hps = Some(difficulty.map(network_hashrate_hz));
        self
    }

    /// Derived estimate fields
    pub fn estimate(
        mut self,
        expected_seconds: Option<f64>,
        expected_human: Option<String>,
        odds: BTreeMap<String, String>,
    ) -> Self {
        self.expected_seconds = Some(expected_seconds);
        self.expected_human = Some(expected_human);
        self.odds = Some(odds);
        self
    }

    /// Sensor producer field
    pub fn cpu_temp(mut self, celsius: Option<f64>) -> Self {
        self.cpu_temp_c = Some(celsius);
        self
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(self, state: &mut StatsState) {
        if let Some(v) = self.hashrate_hps {
            state.hashrate_hps = v;
        }
        if let Some(v) = self.display_hashrate_hps {
            state.display_hashrate_hps = v;
        }
        if let Some(v) = self.source {
            state.source = v;
        }
        if let Some(v) = self.difficulty {
            state.difficulty = v;
        }
        if let Some(v) = self.height {
            state.height = v;
        }
        if let Some(v) = self.network_hps {
            state.network_hps = v;
        }
        if let Some(v) = self.expected_seconds {
            state.expected_seconds = v;
        }
        if let Some(v) = self.expected_human {
            state.expected_human = v;
        }
        if let Some(v) = self.odds {
            state.odds = v;
        }
        if let Some(v) = self.cpu_temp_c {
            state.cpu_temp_c = v;
        }
    }
}

/// Mutex-guarded [`StatsState`] shared between producers and consumers
#[derive(Debug, Default)]
pub struct StatsSnapshot {
    inner: Mutex<StatsState>,
}

impl StatsSnapshot {
    /// Creates a store holding the initial state
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `update` into the state and stamps the update time
    ///
    /// The merge happens under the lock, so no reader sees half of it.
    pub fn update(&self, update: StatsUpdate) {
        let mut state = self.lock();
        update.apply(&mut state);
        state.time = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true));
    }

    /// Serializes the current state to JSON bytes
    ///
    /// Serialization runs while the lock is held, so the bytes describe one
    /// consistent state.
    pub fn snapshot(&self) -> Result<Vec<u8>, TelemetryError> {
        let state = self.lock();
        Ok(serde_json::to_vec(&*state)?)
    }

    /// Clones the current state for in-process readers
    pub fn state(&self) -> StatsState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, StatsState> {
        // A panicking writer leaves at worst a stale field, never a torn one.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
