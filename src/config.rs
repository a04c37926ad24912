use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONFIG_FILE: &str = "product_info";
const ENV_PREFIX: &str = "PRODUCT_INFO";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra `tracing` directive layered over `RUST_LOG`.
    pub log_filter: String,
    pub fetch: FetchConfig,
}

/// Settings handed to the fetch collaborator at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_retries: u32,
    /// Seconds; retry `n` waits `backoff_factor * 2^(n-1)`.
    pub backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "product_info=warn".to_string(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 0.3,
            retry_statuses: vec![429, 500, 502, 503, 504],
            timeout_secs: 25,
            user_agent: "Mozilla/5.0 (compatible; ProductInfo/1.2)".to_string(),
            accept_language: "en-US,en;q=0.8,zh-TW;q=0.7".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `product_info.*` in the working directory, then
    /// `PRODUCT_INFO__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("fetch.retry_statuses")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let secs = self.backoff_factor * f64::from(1u32 << exponent);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fetch_contract() {
        let config = Config::default();
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.retry_statuses, vec![429, 500, 502, 503, 504]);
        assert!(config.fetch.is_retryable(503));
        assert!(!config.fetch.is_retryable(404));
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let fetch = FetchConfig::default();
        assert_eq!(fetch.backoff(1), Duration::from_secs_f64(0.3));
        assert_eq!(fetch.backoff(2), Duration::from_secs_f64(0.6));
        assert_eq!(fetch.backoff(3), Duration::from_secs_f64(1.2));
    }

    #[test]
    fn zero_factor_means_no_wait() {
        let fetch = FetchConfig {
            backoff_factor: 0.0,
            ..Default::default()
        };
        assert_eq!(fetch.backoff(2), Duration::ZERO);
    }

    #[test]
    fn partial_sources_keep_remaining_defaults() {
        let config: Config = serde_json::from_str(r#"{"fetch": {"max_retries": 5}}"#).unwrap();
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.timeout_secs, 25);
        assert_eq!(config.log_filter, "product_info=warn");
    }
}
