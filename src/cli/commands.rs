// src/cli/commands.rs
use crate::types::SourceMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solo Odds - live hashrate and solo block odds for a local miner
#[derive(Parser, Debug)]
#[command(name = "solo-odds-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform (run the service, probe once, or generate config)
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Run the producers and serve stats over HTTP until interrupted
    Start(StartOptions),

    /// Take one hashrate reading and one network fetch, print the odds and exit
    Probe(ProbeOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for running the service
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file (defaults and environment only when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Hashrate source (overrides config and MINER_MODE)
    #[arg(short, long, value_enum)]
    pub mode: Option<SourceMode>,

    /// HTTP port (overrides config and WEB_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Options for a one-shot probe
#[derive(Parser, Debug)]
pub struct ProbeOptions {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Hashrate source (overrides config and MINER_MODE)
    #[arg(short, long, value_enum)]
    pub mode: Option<SourceMode>,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_overrides() {
        let cli = Commands::try_parse_from(["solo-odds-rs", "start", "--mode", "log-tail", "-p", "9090"])
            .unwrap();
        match cli.action {
            Action::Start(opts) => {
                assert_eq!(opts.mode, Some(SourceMode::LogTail));
                assert_eq!(opts.port, Some(9090));
                assert!(opts.config.is_none());
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_config_default_output() {
        let cli = Commands::try_parse_from(["solo-odds-rs", "config"]).unwrap();
        match cli.action {
            Action::Config(opts) => assert_eq!(opts.output, PathBuf::from("config.toml")),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Commands::try_parse_from(["solo-odds-rs", "probe", "--mode", "gpu"]).is_err());
    }
}
