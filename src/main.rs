// src/main.rs
use clap::Parser;
use solo_odds_rs::stats::format::{PLACEHOLDER, human_duration, human_hashrate};
use solo_odds_rs::stats::{Estimate, effective_hashrate};
use solo_odds_rs::utils::logging::init_probe_logging;
use solo_odds_rs::{self, *};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Main entry point
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), TelemetryError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_service(opts),
        cli::Action::Probe(opts) => run_probe(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Runs the producers and the HTTP surface until Ctrl-C
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads configuration and applies CLI overrides
/// 3. Binds the HTTP listener so a taken port fails fast
/// 4. Starts the producers and the web server
/// 5. Waits for Ctrl-C, then cancels everything and joins
fn start_service(opts: cli::StartOptions) -> Result<(), TelemetryError> {
    utils::init_logging();

    let mut config = config::load(opts.config)?;
    if let Some(mode) = opts.mode {
        config.source = mode;
    }
    if let Some(port) = opts.port {
        config.http_port = port;
    }
    config.validate()?;

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let snapshot = Arc::new(StatsSnapshot::new());
        let fetcher = NetworkStatsFetcher::from_config(&config)?;
        let listener = web::bind(&config).await?;
        let source = build_source(&config);

        let mut monitor = Monitor::new(config, snapshot.clone());
        monitor.start(source, fetcher);

        let mut web_task = tokio::spawn(web::serve(listener, snapshot, monitor.token()));

        let server_exit = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                log::info!("Interrupted, shutting down");
                None
            }
            result = &mut web_task => Some(result),
        };

        // Cancelling the producers also stops the web server
        monitor.shutdown().await;
        let result = match server_exit {
            Some(result) => result,
            None => web_task.await,
        };
        result?
    })
}

/// Takes one reading and prints the resulting odds
fn run_probe(opts: cli::ProbeOptions) -> Result<(), TelemetryError> {
    init_probe_logging();

    let mut config = config::load(opts.config)?;
    if let Some(mode) = opts.mode {
        config.source = mode;
    }
    config.validate()?;

    let rt = Runtime::new()?;
    rt.block_on(async {
        let source = build_source(&config);
        let fetcher = NetworkStatsFetcher::from_config(&config)?;

        let src = source.clone();
        let sample = tokio::task::spawn_blocking(move || src.sample()).await?;
        let mut network = NetworkStats::default();
        let fetch = fetcher.refresh(&mut network).await;

        let hashrate = effective_hashrate(sample.value_hz, sample.source, &config);
        let estimate = Estimate::compute(hashrate, network.difficulty);

        println!("Source:       {}", sample.label);
        println!("Hashrate:     {}", human_hashrate(sample.value_hz));
        if hashrate.source == SampleSource::Fallback {
            println!("Odds based on baseline {}", human_hashrate(hashrate.hz));
        }
        println!(
            "Difficulty:   {}",
            network
                .difficulty
                .map(|d| format!("{:.0}", d))
                .unwrap_or_else(|| PLACEHOLDER.into())
        );
        println!(
            "Height:       {}",
            network
                .height
                .map(|h| h.to_string())
                .unwrap_or_else(|| PLACEHOLDER.into())
        );
        if fetch.status != "OK" {
            println!("Network:      {}", fetch.status);
        }
        println!(
            "Expected:     {}",
            estimate
                .expected_seconds
                .map(human_duration)
                .unwrap_or_else(|| PLACEHOLDER.into())
        );
        for (name, text) in &estimate.odds {
            println!("Odds {:<8} {}", format!("{}:", name), text);
        }

        Ok(())
    })
}

/// Writes the configuration template to the requested path
fn generate_config(opts: cli::ConfigOptions) -> Result<(), TelemetryError> {
    let template = config::generate_template();
    std::fs::write(&opts.output, template)?;
    println!("Wrote {}", opts.output.display());
    Ok(())
}
