// src/network/fetcher.rs
use crate::config::Config;
use crate::utils::error::TelemetryError;
use crate::utils::unix_now;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Per-request timeout for the public statistics endpoints
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one fetch round
///
/// A field is `None` only if its own request failed this round.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkFetch {
    /// Network difficulty, if the difficulty request succeeded
    pub difficulty: Option<f64>,
    /// Block height, if the height request succeeded
    pub height: Option<u64>,
    /// `"OK"`, or the failures of this round joined with `"; "`
    pub status: String,
}

/// Latest known network statistics
///
/// Fields are only ever replaced by newer successful values, so a failed
/// request leaves the previous value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    /// Network difficulty
    pub difficulty: Option<f64>,
    /// Block height
    pub height: Option<u64>,
    /// When a field last changed, seconds since the Unix epoch
    pub fetched_at: Option<f64>,
}

impl NetworkStats {
    /// Applies a fetch result, keeping cached values for failed fields
    ///
    /// # Returns
    /// `true` if any field was refreshed
    pub fn merge(&mut self, fetch: &NetworkFetch, now: f64) -> bool {
        let mut refreshed = false;
        if let Some(d) = fetch.difficulty {
            self.difficulty = Some(d);
            refreshed = true;
        }
        if let Some(h) = fetch.height {
            self.height = Some(h);
            refreshed = true;
        }
        if refreshed {
            self.fetched_at = Some(now);
        }
        refreshed
    }
}

/// Client for the plain-text difficulty and block height endpoints
pub struct NetworkStatsFetcher {
    /// HTTP client carrying the request timeout
    client: Client,
    difficulty_url: String,
    height_url: String,
}

impl NetworkStatsFetcher {
    /// Creates a fetcher for the two endpoints
    ///
    /// # Errors
    /// Returns `TelemetryError::HttpError` if the HTTP client can't be built
    pub fn new(
        difficulty_url: impl Into<String>,
        height_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TelemetryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("solo-odds/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(NetworkStatsFetcher {
            client,
            difficulty_url: difficulty_url.into(),
            height_url: height_url.into(),
        })
    }

    /// Creates a fetcher from `difficulty_url` / `height_url`
    pub fn from_config(config: &Config) -> Result<Self, TelemetryError> {
        Self::new(
            config.difficulty_url.clone(),
            config.height_url.clone(),
            REQUEST_TIMEOUT,
        )
    }

    /// Requests difficulty, then height
    ///
    /// The height request is made even if the difficulty request failed.
    /// Never fails; problems are reported in [`NetworkFetch::status`].
    pub async fn fetch(&self) -> NetworkFetch {
        let mut problems = Vec::new();

        let difficulty = match self.fetch_difficulty().await {
            Ok(d) => Some(d),
            Err(e) => {
                problems.push(format!("difficulty err: {}", e));
                None
            }
        };

        let height = match self.fetch_height().await {
            Ok(h) => Some(h),
            Err(e) => {
                problems.push(format!("height err: {}", e));
                None
            }
        };

        let status = if problems.is_empty() {
            "OK".to_string()
        } else {
            problems.join("; ")
        };

        NetworkFetch {
            difficulty,
            height,
            status,
        }
    }

    /// Fetches and merges the result into `stats`
    pub async fn refresh(&self, stats: &mut NetworkStats) -> NetworkFetch {
        let fetch = self.fetch().await;
        stats.merge(&fetch, unix_now());
        fetch
    }

    async fn fetch_difficulty(&self) -> Result<f64, TelemetryError> {
        let body = self.get_text(&self.difficulty_url).await?;
        let difficulty: f64 = body.trim().parse()?;
        if !difficulty.is_finite() || difficulty <= 0.0 {
            return Err(TelemetryError::ParseError(format!(
                "difficulty must be positive, got {}",
                difficulty
            )));
        }
        Ok(difficulty)
    }

    async fn fetch_height(&self) -> Result<u64, TelemetryError> {
        let body = self.get_text(&self.height_url).await?;
        Ok(body.trim().parse()?)
    }

    /// GETs `url` and returns the body of a successful response
    async fn get_text(&self, url: &str) -> Result<String, TelemetryError> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(text)
    }
}
