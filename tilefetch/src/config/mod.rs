//! Downloader configuration.
//!
//! [`DownloaderConfig`] carries the scheduler and estimator tuning. It can be
//! built in code with the `with_*` methods or read from the `[download]`
//! section of an INI file:
//!
//! ```ini
//! [download]
//! concurrency_limit = 20
//! max_retries = 2
//! retry_delay_ms = 0
//! request_timeout = 30
//! user_agent = my-offline-maps/1.0
//! average_bytes_per_tile = 13375
//! ```

mod parser;

use std::path::Path;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::provider::DEFAULT_USER_AGENT;

/// Default number of simultaneous tile requests.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 20;

/// Default number of automatic retries after a failed fetch.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Average size of a raster tile, used for estimates.
pub const DEFAULT_AVERAGE_BYTES_PER_TILE: u64 = 13_375;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Config text is not valid INI
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ini::ParseError),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Tuning for the download scheduler and size estimator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// Maximum number of workers draining the queue at once.
    pub concurrency_limit: usize,

    /// Automatic retries after the first failed attempt.
    pub max_retries: u32,

    /// Pause between attempts on the same URL.
    pub retry_delay: Duration,

    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,

    /// User-Agent sent with every request.
    pub user_agent: String,

    /// Average tile size used by the estimator.
    pub average_bytes_per_tile: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::ZERO,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            average_bytes_per_tile: DEFAULT_AVERAGE_BYTES_PER_TILE,
        }
    }
}

impl DownloaderConfig {
    /// Sets the worker cap. Values below 1 are raised to 1.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_average_bytes_per_tile(mut self, bytes: u64) -> Self {
        self.average_bytes_per_tile = bytes;
        self
    }

    /// Loads configuration from an INI file.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parser::parse_ini(&ini)
    }

    /// Parses configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        parser::parse_ini(&ini)
    }
}
