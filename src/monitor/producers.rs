// src/monitor/producers.rs
//! Background producer loops
//!
//! Each loop owns its own state, wakes on its own interval and writes only
//! its own group of snapshot fields. All of them exit promptly once the
//! cancellation token fires.

use crate::network::{NetworkStats, NetworkStatsFetcher};
use crate::source::HashrateSource;
use crate::stats::{CpuTempSensor, SlidingWindowSeries, StatsReporter, StatsSnapshot, StatsUpdate};
use crate::utils::error::TelemetryError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Seconds between summary log lines
const SUMMARY_EVERY_SECS: u64 = 60;

fn ticker(period: Duration) -> time::Interval {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Waits for the next tick; `false` once cancelled
async fn next_tick(interval: &mut time::Interval, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = interval.tick() => true,
    }
}

/// Polls the hashrate source and feeds the display series
///
/// Polls run on the blocking pool because adapters do synchronous I/O
/// bounded by their own timeouts.
pub async fn run_hashrate_loop(
    source: Arc<dyn HashrateSource>,
    mut series: SlidingWindowSeries,
    snapshot: Arc<StatsSnapshot>,
    period: Duration,
    token: CancellationToken,
) {
    let mut interval = ticker(period);
    let mut last_label: Option<String> = None;

    while next_tick(&mut interval, &token).await {
        let src = source.clone();
        let sample = match tokio::task::spawn_blocking(move || src.sample()).await {
            Ok(sample) => sample,
            Err(e) => {
                log::warn!("Hashrate poll failed: {}", TelemetryError::from(e));
                continue;
            }
        };

        if last_label.as_deref() != Some(sample.label.as_str()) {
            log::info!("Hashrate source: {}", sample.label);
            last_label = Some(sample.label.clone());
        }

        let display = series.tick(sample.timestamp, sample.value_hz);
        snapshot.update(StatsUpdate::new().hashrate(sample.value_hz, display, sample.label));
    }

    log::debug!("Hashrate loop stopped");
}

/// Fetches network difficulty and height
///
/// The first fetch happens immediately. Failed fields keep their cached
/// values; the snapshot always gets the cache.
pub async fn run_network_loop(
    fetcher: NetworkStatsFetcher,
    snapshot: Arc<StatsSnapshot>,
    period: Duration,
    token: CancellationToken,
) {
    let mut interval = ticker(period);
    let mut stats = NetworkStats::default();
    let mut last_status = String::new();

    while next_tick(&mut interval, &token).await {
        let fetch = tokio::select! {
            _ = token.cancelled() => break,
            fetch = fetcher.refresh(&mut stats) => fetch,
        };

        if fetch.status != last_status {
            if fetch.status == "OK" {
                log::info!(
                    "Network stats: difficulty {:?}, height {:?}",
                    stats.difficulty,
                    stats.height
                );
            } else {
                log::warn!("Network stats: {}", fetch.status);
            }
            last_status = fetch.status.clone();
        }

        snapshot.update(StatsUpdate::new().network(stats.difficulty, stats.height));
    }

    log::debug!("Network loop stopped");
}

/// Reads the CPU temperature
pub async fn run_sensor_loop(
    sensor: CpuTempSensor,
    snapshot: Arc<StatsSnapshot>,
    period: Duration,
    token: CancellationToken,
) {
    let mut interval = ticker(period);
    let mut sensor = Some(sensor);

    while next_tick(&mut interval, &token).await {
        let Some(mut s) = sensor.take() else { break };
        match tokio::task::spawn_blocking(move || {
            let reading = s.read();
            (s, reading)
        })
        .await
        {
            Ok((s, reading)) => {
                sensor = Some(s);
                snapshot.update(StatsUpdate::new().cpu_temp(reading));
            }
            Err(e) => {
                log::warn!("Temperature sensor failed, disabling: {}", TelemetryError::from(e));
                break;
            }
        }
    }

    log::debug!("Sensor loop stopped");
}

/// Recomputes expected time and odds
///
/// Stands in for the display's refresh tick: the derived fields follow the
/// latest hashrate and difficulty once per period.
pub async fn run_refresh_loop(reporter: StatsReporter, period: Duration, token: CancellationToken) {
    let mut interval = ticker(period);
    let summary_every = (SUMMARY_EVERY_SECS / period.as_secs().max(1)).max(1);
    let mut ticks: u64 = 0;

    while next_tick(&mut interval, &token).await {
        let (state, estimate) = reporter.refresh();
        if ticks % summary_every == 0 {
            reporter.log_summary(&state, &estimate);
        }
        ticks = ticks.wrapping_add(1);
    }

    log::debug!("Refresh loop stopped");
}
