// src/monitor/mod.rs
//! Task supervision
//!
//! [`Monitor`] wires the configured source, fetcher and sensor to the shared
//! [`StatsSnapshot`] and runs one tokio task per producer. Shutdown is
//! cooperative through a single `CancellationToken`.

/// Producer loop implementations
///
/// One async function per background task, each with its own interval.
pub mod producers;

use crate::config::Config;
use crate::network::NetworkStatsFetcher;
use crate::source::HashrateSource;
use crate::stats::{CpuTempSensor, SlidingWindowSeries, StatsReporter, StatsSnapshot};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs and stops the background producers
pub struct Monitor {
    /// Effective configuration
    config: Config,
    /// State shared with consumers
    snapshot: Arc<StatsSnapshot>,
    /// Cancels every task started by this monitor
    token: CancellationToken,
    /// Running producer tasks
    tasks: Vec<JoinHandle<()>>,
}

impl Monitor {
    /// Creates a monitor writing into `snapshot`
    pub fn new(config: Config, snapshot: Arc<StatsSnapshot>) -> Self {
        Monitor {
            config,
            snapshot,
            token: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Token cancelled on shutdown; hand it to consumers that should stop too
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Shared snapshot
    pub fn snapshot(&self) -> Arc<StatsSnapshot> {
        self.snapshot.clone()
    }

    /// Spawns the hashrate, network, sensor and refresh tasks
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, source: Arc<dyn HashrateSource>, fetcher: NetworkStatsFetcher) {
        let config = &self.config;
        let series = SlidingWindowSeries::new(
            config.baseline_hz(),
            config.display_jitter_pct,
            config.show_odds_when_zero,
        );
        let reporter = StatsReporter::new(self.snapshot.clone(), config.clone(), source.kind());
        let sensor = CpuTempSensor::new(config.cpu_temp_path.clone());

        log::info!(
            "Starting producers: source {}, poll {}s, network {}s, refresh {}s",
            config.source,
            config.poll_interval_secs,
            config.network_interval_secs,
            config.ui_refresh_secs
        );

        self.tasks.push(tokio::spawn(producers::run_hashrate_loop(
            source,
            series,
            self.snapshot.clone(),
            config.poll_interval(),
            self.token.clone(),
        )));
        self.tasks.push(tokio::spawn(producers::run_network_loop(
            fetcher,
            self.snapshot.clone(),
            config.network_interval(),
            self.token.clone(),
        )));
        self.tasks.push(tokio::spawn(producers::run_sensor_loop(
            sensor,
            self.snapshot.clone(),
            config.sensor_interval(),
            self.token.clone(),
        )));
        self.tasks.push(tokio::spawn(producers::run_refresh_loop(
            reporter,
            config.ui_refresh_interval(),
            self.token.clone(),
        )));
    }

    /// Cancels all tasks and waits for them to finish
    pub async fn shutdown(self) {
        self.token.cancel();
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                log::warn!("Producer task ended abnormally: {}", e);
            }
        }
        log::info!("All producers stopped");
    }
}
