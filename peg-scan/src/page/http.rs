//! HTTP page fetcher.

use async_trait::async_trait;
use peg_common::config::FetchConfig;
use std::time::Duration;
use tracing::debug;

use super::{FetchError, PageFetcher, RawPage};

/// Fetches fund pages over HTTP with a per-request timeout.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with the given timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    /// Create from config
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), &config.user_agent)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, address: &str) -> Result<RawPage, FetchError> {
        debug!(address = %address, "Fetching holdings page");

        let response = self.client.get(address).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    address: address.to_string(),
                }
            } else {
                FetchError::Network {
                    address: address.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| FetchError::Body {
            address: address.to_string(),
            message: e.to_string(),
        })?;

        let page = RawPage::from_html(&html);
        debug!(
            address = %address,
            title = %page.title,
            body_len = page.body.len(),
            "Holdings page flattened"
        );

        Ok(page)
    }
}
