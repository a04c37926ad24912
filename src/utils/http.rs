use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, ClientBuilder};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Source of page bodies for the extraction engine.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub fn create_client(config: &FetchConfig) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    let language = HeaderValue::from_str(&config.accept_language)
        .map_err(|e| FetchError::Client(format!("invalid Accept-Language: {}", e)))?;
    headers.insert(ACCEPT_LANGUAGE, language);

    ClientBuilder::new()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}

/// GET `url`, retrying transport errors and retryable statuses with
/// exponential backoff. Other error statuses fail at once.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    config: &FetchConfig,
) -> Result<String, FetchError> {
    let mut retries = 0;

    loop {
        let failure: FetchError = match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Fetched {} ({})", url, response.status());
                return Ok(response.text().await?);
            }
            Ok(response) => {
                let status = response.status();
                warn!("HTTP error {}: {}", status, url);
                let err = FetchError::Status {
                    status,
                    url: url.to_string(),
                };
                if !config.is_retryable(status.as_u16()) {
                    return Err(err);
                }
                err
            }
            Err(e) if e.is_builder() => return Err(e.into()),
            Err(e) => {
                error!("Request failed for {}: {}", url, e);
                e.into()
            }
        };

        if retries >= config.max_retries {
            return Err(failure);
        }
        retries += 1;

        let delay = config.backoff(retries);
        warn!("Retrying in {:?}... (retry {}/{})", delay, retries, config.max_retries);
        sleep(delay).await;
    }
}

/// `reqwest`-backed fetcher configured once at construction.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = create_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        fetch_with_retry(&self.client, url, &self.config).await
    }
}
