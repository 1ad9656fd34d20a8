use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::TrendScoutError;
use crate::redact;

const DEFAULT_DAILY_QUOTA: u64 = 10_000;
const DEFAULT_WORKERS: usize = 3;
const DEFAULT_OUTPUT: &str = "trending_topics_info.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// YouTube Data API keys, in selection priority order.
    pub youtube_api_keys: Vec<String>,
    /// Daily quota units granted to each key.
    pub youtube_daily_quota: u64,

    // Forum scraping
    pub apify_api_token: String,

    // Pipeline
    pub workers: usize,
    pub output_path: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, TrendScoutError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrendScoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let youtube_api_keys: Vec<String> = required(&lookup, "YOUTUBE_API_KEYS")?
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
        if youtube_api_keys.is_empty() {
            return Err(TrendScoutError::Config(
                "YOUTUBE_API_KEYS must list at least one key".to_string(),
            ));
        }

        let workers = parsed(&lookup, "TRENDSCOUT_WORKERS", DEFAULT_WORKERS)?;
        if workers == 0 {
            return Err(TrendScoutError::Config(
                "TRENDSCOUT_WORKERS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            youtube_api_keys,
            youtube_daily_quota: parsed(&lookup, "YOUTUBE_DAILY_QUOTA", DEFAULT_DAILY_QUOTA)?,
            apify_api_token: required(&lookup, "APIFY_API_TOKEN")?,
            workers,
            output_path: lookup("TRENDSCOUT_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            http_timeout: Duration::from_secs(parsed(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }

    /// Log the loaded configuration with secrets shortened.
    pub fn log_redacted(&self) {
        let keys: Vec<String> = self.youtube_api_keys.iter().map(|k| redact(k)).collect();
        info!(
            youtube_keys = ?keys,
            daily_quota = self.youtube_daily_quota,
            apify_token = %redact(&self.apify_api_token),
            workers = self.workers,
            output = %self.output_path.display(),
            http_timeout_secs = self.http_timeout.as_secs(),
            "Configuration loaded"
        );
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, TrendScoutError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TrendScoutError::Config(format!("{key} environment variable is required")))
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, TrendScoutError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TrendScoutError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = Config::from_lookup(lookup(&[
            ("YOUTUBE_API_KEYS", "key-a, key-b ,,key-c"),
            ("APIFY_API_TOKEN", "apify"),
        ]))
        .unwrap();

        assert_eq!(config.youtube_api_keys, vec!["key-a", "key-b", "key-c"]);
        assert_eq!(config.youtube_daily_quota, 10_000);
        assert_eq!(config.workers, 3);
        assert_eq!(config.output_path, PathBuf::from("trending_topics_info.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_keys_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("APIFY_API_TOKEN", "apify")])).unwrap_err();
        assert!(matches!(err, TrendScoutError::Config(msg) if msg.contains("YOUTUBE_API_KEYS")));

        let err = Config::from_lookup(lookup(&[
            ("YOUTUBE_API_KEYS", " , "),
            ("APIFY_API_TOKEN", "apify"),
        ]))
        .unwrap_err();
        assert!(matches!(err, TrendScoutError::Config(_)));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("YOUTUBE_API_KEYS", "k"),
            ("APIFY_API_TOKEN", "apify"),
            ("YOUTUBE_DAILY_QUOTA", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, TrendScoutError::Config(msg) if msg.contains("YOUTUBE_DAILY_QUOTA")));

        let err = Config::from_lookup(lookup(&[
            ("YOUTUBE_API_KEYS", "k"),
            ("APIFY_API_TOKEN", "apify"),
            ("TRENDSCOUT_WORKERS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, TrendScoutError::Config(_)));
    }
}
