//! INI parsing for [`DownloaderConfig`].

use std::str::FromStr;
use std::time::Duration;

use ini::Ini;

use super::{ConfigError, DownloaderConfig};

const SECTION: &str = "download";

pub(super) fn parse_ini(ini: &Ini) -> Result<DownloaderConfig, ConfigError> {
    let mut config = DownloaderConfig::default();

    let Some(section) = ini.section(Some(SECTION)) else {
        return Ok(config);
    };

    if let Some(v) = section.get("concurrency_limit") {
        let limit: usize = parse_value("concurrency_limit", v, "must be a positive integer")?;
        if limit == 0 {
            return Err(invalid("concurrency_limit", v, "must be at least 1"));
        }
        config.concurrency_limit = limit;
    }
    if let Some(v) = section.get("max_retries") {
        config.max_retries = parse_value("max_retries", v, "must be a non-negative integer")?;
    }
    if let Some(v) = section.get("retry_delay_ms") {
        let ms: u64 = parse_value("retry_delay_ms", v, "must be a non-negative integer (milliseconds)")?;
        config.retry_delay = Duration::from_millis(ms);
    }
    if let Some(v) = section.get("request_timeout") {
        let secs: u64 = parse_value("request_timeout", v, "must be a positive integer (seconds)")?;
        if secs == 0 {
            return Err(invalid("request_timeout", v, "must be at least 1 second"));
        }
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(v) = section.get("user_agent") {
        let v = v.trim();
        if v.is_empty() {
            return Err(invalid("user_agent", v, "must not be empty"));
        }
        config.user_agent = v.to_string();
    }
    if let Some(v) = section.get("average_bytes_per_tile") {
        config.average_bytes_per_tile =
            parse_value("average_bytes_per_tile", v, "must be a non-negative integer (bytes)")?;
    }

    Ok(config)
}

fn parse_value<T: FromStr>(key: &str, value: &str, reason: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value, reason))
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
