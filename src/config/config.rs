// src/config/config.rs
use crate::{types::SourceMode, utils::error::TelemetryError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Main configuration structure for the telemetry service
///
/// Every field has a default, so an empty TOML file (or no file at all) is
/// a valid configuration. Values are layered: defaults, then the TOML file,
/// then environment variables, then command-line overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which hashrate source to use
    pub source: SourceMode,

    /// Host of the miner's status API
    pub api_host: String,

    /// Port of the miner's status API (cgminer default: 4028)
    pub api_port: u16,

    /// Command sent to the miner's status API
    pub api_command: String,

    /// Miner log file followed in `log-tail` mode
    pub log_path: PathBuf,

    /// Synthetic source baseline in kH/s; also the odds/display fallback
    pub synthetic_base_khs: f64,

    /// Synthetic source jitter in kH/s (uniform, ±)
    pub synthetic_jitter_khs: f64,

    /// Relative jitter applied to the fallback display value (0.06 = ±6%)
    pub display_jitter_pct: f64,

    /// Keep showing odds and a plotted baseline while the miner reports 0
    pub show_odds_when_zero: bool,

    /// Seconds between derived-stats refresh ticks
    pub ui_refresh_secs: u64,

    /// Seconds between hashrate polls
    pub poll_interval_secs: u64,

    /// Seconds between network difficulty/height fetches
    pub network_interval_secs: u64,

    /// Seconds between CPU temperature reads
    pub sensor_interval_secs: u64,

    /// Plain-text difficulty endpoint
    pub difficulty_url: String,

    /// Plain-text block height endpoint
    pub height_url: String,

    /// Address the HTTP surface binds to
    pub http_bind: String,

    /// Port of the HTTP surface
    pub http_port: u16,

    /// Thermal zone file holding the CPU temperature in millidegrees
    pub cpu_temp_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceMode::Auto,
            api_host: "127.0.0.1".into(),
            api_port: 4028,
            api_command: "summary".into(),
            log_path: PathBuf::from("cpuminer.log"),
            synthetic_base_khs: 250.0,
            synthetic_jitter_khs: 25.0,
            display_jitter_pct: 0.06,
            show_odds_when_zero: true,
            ui_refresh_secs: 1,
            poll_interval_secs: 1,
            network_interval_secs: 120,
            sensor_interval_secs: 2,
            difficulty_url: "https://blockchain.info/q/getdifficulty".into(),
            height_url: "https://mempool.space/api/blocks/tip/height".into(),
            http_bind: "0.0.0.0".into(),
            http_port: 8080,
            cpu_temp_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
        }
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(TelemetryError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, TelemetryError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            TelemetryError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_str)
    }

    /// Parses configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, TelemetryError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), TelemetryError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup
    ///
    /// Keys follow the environment variable names (`MINER_MODE`,
    /// `MINER_API_PORT`, ...). Empty values are ignored.
    ///
    /// # Errors
    /// Returns `TelemetryError::ConfigError` naming the offending key when a
    /// value cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), TelemetryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MINER_MODE") {
            self.source = SourceMode::from_str(&v).map_err(TelemetryError::ConfigError)?;
        }
        if let Some(v) = get("MINER_API_HOST") {
            self.api_host = v;
        }
        if let Some(v) = get("MINER_API_PORT") {
            self.api_port = parse_value("MINER_API_PORT", &v)?;
        }
        if let Some(v) = get("MINER_API_COMMAND") {
            self.api_command = v;
        }
        if let Some(v) = get("CPUMINER_LOG") {
            self.log_path = PathBuf::from(v);
        }
        if let Some(v) = get("MOCK_KHS_BASE") {
            self.synthetic_base_khs = parse_value("MOCK_KHS_BASE", &v)?;
        }
        if let Some(v) = get("MOCK_KHS_JITTER") {
            self.synthetic_jitter_khs = parse_value("MOCK_KHS_JITTER", &v)?;
        }
        if let Some(v) = get("GRAPH_JITTER_PCT") {
            self.display_jitter_pct = parse_value("GRAPH_JITTER_PCT", &v)?;
        }
        if let Some(v) = get("SHOW_ODDS_WHEN_ZERO") {
            self.show_odds_when_zero = v.trim() == "1";
        }
        if let Some(v) = get("WEB_PORT") {
            self.http_port = parse_value("WEB_PORT", &v)?;
        }
        if let Some(v) = get("API_DIFFICULTY") {
            self.difficulty_url = v;
        }
        if let Some(v) = get("API_HEIGHT") {
            self.height_url = v;
        }
        if let Some(v) = get("CPU_TEMP_PATH") {
            self.cpu_temp_path = PathBuf::from(v);
        }

        Ok(())
    }

    /// Checks value ranges and endpoint URLs
    pub fn validate(&self) -> Result<(), TelemetryError> {
        for (name, secs) in [
            ("ui_refresh_secs", self.ui_refresh_secs),
            ("poll_interval_secs", self.poll_interval_secs),
            ("network_interval_secs", self.network_interval_secs),
            ("sensor_interval_secs", self.sensor_interval_secs),
        ] {
            if secs == 0 {
                return Err(TelemetryError::ConfigError(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        if !(self.synthetic_base_khs.is_finite() && self.synthetic_base_khs >= 0.0) {
            return Err(TelemetryError::ConfigError(
                "synthetic_base_khs must be a non-negative number".into(),
            ));
        }
        if !(self.synthetic_jitter_khs.is_finite() && self.synthetic_jitter_khs >= 0.0) {
            return Err(TelemetryError::ConfigError(
                "synthetic_jitter_khs must be a non-negative number".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.display_jitter_pct) {
            return Err(TelemetryError::ConfigError(
                "display_jitter_pct must be in [0, 1)".into(),
            ));
        }

        for url_str in [&self.difficulty_url, &self.height_url] {
            let url = Url::parse(url_str)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(TelemetryError::ConfigError(format!(
                    "Endpoint '{}' must use http or https",
                    url_str
                )));
            }
        }

        Ok(())
    }

    /// Interval between hashrate polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Interval between network fetches
    pub fn network_interval(&self) -> Duration {
        Duration::from_secs(self.network_interval_secs)
    }

    /// Interval between refresh ticks
    pub fn ui_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.ui_refresh_secs)
    }

    /// Interval between temperature reads
    pub fn sensor_interval(&self) -> Duration {
        Duration::from_secs(self.sensor_interval_secs)
    }

    /// Fallback hashrate in H/s derived from the synthetic baseline
    pub fn baseline_hz(&self) -> f64 {
        self.synthetic_base_khs * 1e3
    }

    /// Generates a configuration template string
    ///
    /// # Returns
    /// String containing a commented TOML configuration template with the
    /// default values filled in
    pub fn generate_template() -> String {
        let d = Config::default();
        let mut template = String::new();
        template.push_str("# Solo odds telemetry configuration\n");
        template.push_str("# Every key is optional; environment variables override the file.\n\n");
        template.push_str("# Hashrate source: daemon-api, log-tail, auto, synthetic (env: MINER_MODE)\n");
        template.push_str(&format!("source = \"{}\"\n\n", d.source));
        template.push_str("# Miner status API (env: MINER_API_HOST, MINER_API_PORT)\n");
        template.push_str(&format!("api_host = \"{}\"\n", d.api_host));
        template.push_str(&format!("api_port = {}\n", d.api_port));
        template.push_str(&format!("api_command = \"{}\"\n\n", d.api_command));
        template.push_str("# Miner log followed in log-tail mode (env: CPUMINER_LOG)\n");
        template.push_str(&format!("log_path = \"{}\"\n\n", d.log_path.display()));
        template.push_str("# Synthetic source / zero-hashrate fallback, kH/s (env: MOCK_KHS_BASE, MOCK_KHS_JITTER)\n");
        template.push_str(&format!("synthetic_base_khs = {:.1}\n", d.synthetic_base_khs));
        template.push_str(&format!("synthetic_jitter_khs = {:.1}\n\n", d.synthetic_jitter_khs));
        template.push_str("# Display fallback (env: GRAPH_JITTER_PCT, SHOW_ODDS_WHEN_ZERO)\n");
        template.push_str(&format!("display_jitter_pct = {}\n", d.display_jitter_pct));
        template.push_str(&format!("show_odds_when_zero = {}\n\n", d.show_odds_when_zero));
        template.push_str("# Intervals in seconds\n");
        template.push_str(&format!("ui_refresh_secs = {}\n", d.ui_refresh_secs));
        template.push_str(&format!("poll_interval_secs = {}\n", d.poll_interval_secs));
        template.push_str(&format!("network_interval_secs = {}\n", d.network_interval_secs));
        template.push_str(&format!("sensor_interval_secs = {}\n\n", d.sensor_interval_secs));
        template.push_str("# Network statistics (env: API_DIFFICULTY, API_HEIGHT)\n");
        template.push_str(&format!("difficulty_url = \"{}\"\n", d.difficulty_url));
        template.push_str(&format!("height_url = \"{}\"\n\n", d.height_url));
        template.push_str("# HTTP surface (env: WEB_PORT)\n");
        template.push_str(&format!("http_bind = \"{}\"\n", d.http_bind));
        template.push_str(&format!("http_port = {}\n\n", d.http_port));
        template.push_str("# CPU temperature sensor (env: CPU_TEMP_PATH)\n");
        template.push_str(&format!("cpu_temp_path = \"{}\"\n", d.cpu_temp_path.display()));

        template
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, TelemetryError> {
    value
        .trim()
        .parse()
        .map_err(|_| TelemetryError::ConfigError(format!("Invalid value for {}: '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_port, 4028);
        assert_eq!(config.network_interval_secs, 120);
        assert!(config.show_odds_when_zero);
    }

    #[test]
    fn test_partial_toml_deserialization() {
        let toml_str = r#"
            source = "log-tail"
            log_path = "/tmp/miner.log"
            http_port = 9090
            display_jitter_pct = 0.1
        "#;
        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.source, SourceMode::LogTail);
        assert_eq!(config.log_path, PathBuf::from("/tmp/miner.log"));
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.display_jitter_pct, 0.1);
        assert_eq!(config.api_host, "127.0.0.1");
    }

    #[test]
    fn test_unknown_source_mode_rejected() {
        let err = Config::from_toml("source = \"gpu\"").unwrap_err();
        assert!(matches!(err, TelemetryError::ConfigError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MINER_MODE", "mock"),
            ("MOCK_KHS_BASE", "500"),
            ("SHOW_ODDS_WHEN_ZERO", "0"),
            ("WEB_PORT", "8181"),
            ("MINER_API_HOST", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.source, SourceMode::Synthetic);
        assert_eq!(config.synthetic_base_khs, 500.0);
        assert!(!config.show_odds_when_zero);
        assert_eq!(config.http_port, 8181);
        // empty values are ignored
        assert_eq!(config.api_host, "127.0.0.1");
    }

    #[test]
    fn test_env_override_parse_error_names_key() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == "MINER_API_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("MINER_API_PORT"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            difficulty_url: "ftp://example.com/diff".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            height_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(TelemetryError::UrlError(_))));
    }

    #[test]
    fn test_template_parses_back_to_defaults() {
        let config = Config::from_toml(&Config::generate_template()).unwrap();
        assert_eq!(config, Config::default());
    }
}
