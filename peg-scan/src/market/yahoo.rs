//! Yahoo Finance adapter.
//!
//! Ticker search goes through the public search endpoint. Fundamentals come
//! from `quoteSummary`, which needs a session cookie plus a matching crumb;
//! both are obtained once and reused until the provider rejects them.

use async_trait::async_trait;
use peg_common::config::MarketConfig;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::rate_limiter::{shared_limiter, SharedRateLimiter};
use super::{Fundamentals, MarketDataProvider, ProviderError};

const SEARCH_BASE: &str = "https://query2.finance.yahoo.com";
const SUMMARY_BASE: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const SUMMARY_MODULES: &str = "summaryDetail,defaultKeyStatistics";

/// Default retry hint when a 429 carries no Retry-After header.
const RATE_LIMIT_RETRY_SECS: u64 = 60;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    symbol: Option<String>,
    exchange: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<SummaryError>,
}

#[derive(Debug, Deserialize)]
struct SummaryError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
    forward_eps: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
}

/// `{"raw": 12.3, "fmt": "12.30"}`; empty objects stand for missing values.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

/// First symbol among the first `max_results` quotes listed on an accepted exchange.
fn pick_ticker(quotes: &[SearchQuote], exchanges: &[String], max_results: usize) -> Option<String> {
    quotes
        .iter()
        .take(max_results)
        .find(|q| {
            q.exchange
                .as_deref()
                .is_some_and(|ex| exchanges.iter().any(|e| e == ex))
        })
        .and_then(|q| q.symbol.clone())
}

fn fundamentals_from_summary(envelope: SummaryEnvelope) -> Result<Fundamentals, ProviderError> {
    if let Some(error) = envelope.quote_summary.error {
        let code = error.code.unwrap_or_default();
        let description = error.description.unwrap_or_default();
        return Err(if code == "Not Found" {
            ProviderError::DataNotAvailable(description)
        } else {
            ProviderError::Internal(format!("{}: {}", code, description))
        });
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::DataNotAvailable("empty quoteSummary result".into()))?;

    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();

    Ok(Fundamentals {
        trailing_pe: raw(&detail.trailing_pe),
        forward_pe: raw(&detail.forward_pe).or_else(|| raw(&stats.forward_pe)),
        trailing_eps: raw(&stats.trailing_eps),
        forward_eps: raw(&stats.forward_eps),
    })
}

fn map_request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::Network("Connection failed".into())
    } else if e.is_decode() {
        ProviderError::InvalidResponse(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Yahoo Finance market-data adapter.
pub struct YahooFinanceAdapter {
    client: reqwest::Client,
    exchanges: Vec<String>,
    max_results: usize,
    search_base: String,
    summary_base: String,
    cookie_url: String,
    crumb_url: String,
    crumb: Mutex<Option<String>>,
    rate_limiter: SharedRateLimiter,
}

impl YahooFinanceAdapter {
    /// Create from config
    pub fn from_config(config: &MarketConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .gzip(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let rate_limiter = shared_limiter("yahoo", config.requests_per_minute);
        debug!(
            exchanges = ?config.exchanges,
            burst = rate_limiter.capacity(),
            "Yahoo adapter configured"
        );

        Self {
            client,
            exchanges: config.exchanges.clone(),
            max_results: config.max_results,
            search_base: SEARCH_BASE.into(),
            summary_base: SUMMARY_BASE.into(),
            cookie_url: COOKIE_URL.into(),
            crumb_url: CRUMB_URL.into(),
            crumb: Mutex::new(None),
            rate_limiter,
        }
    }

    /// Point search and summary calls at other hosts.
    pub fn with_base_urls(mut self, search_base: impl Into<String>, summary_base: impl Into<String>) -> Self {
        self.search_base = search_base.into();
        self.summary_base = summary_base.into();
        self
    }

    /// Point the cookie and crumb handshake at other endpoints.
    pub fn with_auth_urls(mut self, cookie_url: impl Into<String>, crumb_url: impl Into<String>) -> Self {
        self.cookie_url = cookie_url.into();
        self.crumb_url = crumb_url.into();
        self
    }

    async fn get_json<T>(&self, request: reqwest::RequestBuilder) -> Result<T, ProviderError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.rate_limiter.acquire().await;

        let response = request.send().await.map_err(map_request_error)?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth(format!("HTTP {}", status)));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());

            return Err(ProviderError::RateLimited {
                retry_after_secs: retry_after.or(Some(RATE_LIMIT_RETRY_SECS)),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::DataNotAvailable(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Internal(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Obtain (or reuse) the crumb that authorises quoteSummary calls.
    async fn crumb(&self) -> Result<String, ProviderError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        self.rate_limiter.acquire().await;
        // Only the Set-Cookie matters; the page itself is usually a 404.
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            debug!(url = %self.cookie_url, error = %e, "Yahoo cookie request failed");
        }

        self.rate_limiter.acquire().await;
        let response = self
            .client
            .get(&self.crumb_url)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Auth(format!("crumb request failed: HTTP {}", response.status())));
        }

        let crumb = response.text().await.map_err(map_request_error)?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(ProviderError::Auth("provider returned no crumb".into()));
        }

        debug!("Obtained Yahoo crumb");
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    fn summary_url(&self, ticker: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.summary_base)
            .map_err(|e| ProviderError::Internal(format!("bad summary base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Internal("summary base url cannot be a base".into()))?
            .pop_if_empty()
            .extend(["v10", "finance", "quoteSummary", ticker]);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceAdapter {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn search_ticker(&self, name: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/v1/finance/search", self.search_base.trim_end_matches('/'));
        let quotes_count = self.max_results.to_string();
        let request = self.client.get(&url).query(&[
            ("q", name),
            ("quotesCount", quotes_count.as_str()),
            ("newsCount", "0"),
        ]);

        let response: SearchResponse = self.get_json(request).await?;
        let ticker = pick_ticker(&response.quotes, &self.exchanges, self.max_results);

        debug!(name = %name, ticker = ?ticker, candidates = response.quotes.len(), "Ticker search");
        Ok(ticker)
    }

    async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals, ProviderError> {
        let crumb = self.crumb().await?;
        let url = self.summary_url(ticker)?;
        let request = self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())]);

        match self.get_json::<SummaryEnvelope>(request).await {
            Ok(envelope) => fundamentals_from_summary(envelope),
            Err(ProviderError::Auth(msg)) => {
                warn!(ticker = %ticker, "Yahoo crumb rejected, will refresh on next call");
                *self.crumb.lock().await = None;
                Err(ProviderError::Auth(msg))
            }
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
