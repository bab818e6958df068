use axum::{Router, routing::get};
use solo_odds_rs::network::NetworkStatsFetcher;
use solo_odds_rs::source::{HashrateSource, SyntheticSource};
use solo_odds_rs::{Config, Monitor, SourceMode, StatsSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_chain_endpoints() -> String {
    let app = Router::new()
        .route("/difficulty", get(|| async { "1000000000000\n" }))
        .route("/height", get(|| async { "850000" }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

fn test_config(base: &str) -> Config {
    Config {
        source: SourceMode::Synthetic,
        difficulty_url: format!("{}/difficulty", base),
        height_url: format!("{}/height", base),
        cpu_temp_path: "/nonexistent/thermal".into(),
        ..Config::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_monitor_publishes_and_stops() {
    let base = spawn_chain_endpoints().await;
    let config = test_config(&base);
    let fetcher = NetworkStatsFetcher::new(
        config.difficulty_url.clone(),
        config.height_url.clone(),
        Duration::from_secs(2),
    )
    .unwrap();
    let source: Arc<dyn HashrateSource> = Arc::new(SyntheticSource::new(250.0, 25.0));

    let snapshot = Arc::new(StatsSnapshot::new());
    let mut monitor = Monitor::new(config, snapshot.clone());
    monitor.start(source, fetcher);

    // Refresh ticks once per second; wait for one after the fetch landed
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let state = snapshot.state();
    assert_eq!(state.source, "Mock");
    assert!(state.hashrate_hps >= 225_000.0 && state.hashrate_hps <= 275_000.0);
    assert_eq!(state.display_hashrate_hps, state.hashrate_hps);
    assert_eq!(state.difficulty, Some(1.0e12));
    assert_eq!(state.height, Some(850_000));
    assert!(state.expected_seconds.unwrap() > 0.0);
    assert!(state.expected_human.is_some());
    assert_eq!(state.odds.len(), 3);

    tokio::time::timeout(Duration::from_secs(5), monitor.shutdown())
        .await
        .expect("producers should stop promptly");
}
