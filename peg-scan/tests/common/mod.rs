//! Shared mocks for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use peg_scan::{FetchError, Fundamentals, MarketDataProvider, PageFetcher, ProviderError, RawPage};

// ============================================================================
// Page fixtures
// ============================================================================

/// Build a flattened holdings page body from (stock, sector, weight) rows.
pub fn holdings_body(rows: &[(&str, &str, f64)]) -> String {
    let mut body = format!(
        "Fund overviewExpense ratio0.52%Holdings ({})NameSectorInstrumentAssets",
        rows.len()
    );
    for (stock, sector, weight) in rows {
        body.push_str(&format!("{stock}{sector}Equity{weight:.2}%"));
    }
    body.push_str("See allReturns calculator12.40%Fund managers");
    body
}

// ============================================================================
// Mock page fetcher
// ============================================================================

/// Serves pages from a map; unknown addresses fail with HTTP 404.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, RawPage>,
    calls: AtomicU32,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, address: &str, title: &str, body: impl Into<String>) -> Self {
        self.pages.insert(
            address.to_string(),
            RawPage {
                title: title.to_string(),
                body: body.into(),
            },
        );
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, address: &str) -> Result<RawPage, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.pages.get(address).cloned().ok_or_else(|| FetchError::Status {
            address: address.to_string(),
            status: 404,
        })
    }
}

// ============================================================================
// Mock market-data provider
// ============================================================================

/// What the provider does for one stock name.
#[derive(Clone)]
pub enum Listing {
    /// Search finds `ticker`, fundamentals return these values
    Found(&'static str, Fundamentals),
    /// Search returns no accepted-exchange match
    NotListed,
    /// Search fails with a network error
    SearchFails,
    /// Search finds the ticker but fundamentals time out
    FundamentalsFail(&'static str),
}

/// Table-driven provider counting every call.
#[derive(Default)]
pub struct MockProvider {
    listings: HashMap<String, Listing>,
    pub search_calls: AtomicU32,
    pub fundamentals_calls: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, listing: Listing) -> Self {
        self.listings.insert(name.to_string(), listing);
        self
    }

    /// Listing whose PEG is `pe / growth` with the given values.
    pub fn with_ratios(self, name: &str, ticker: &'static str, pe: f64, eps: f64, feps: f64) -> Self {
        self.with(
            name,
            Listing::Found(
                ticker,
                Fundamentals {
                    trailing_pe: Some(pe),
                    forward_pe: None,
                    trailing_eps: Some(eps),
                    forward_eps: Some(feps),
                },
            ),
        )
    }

    pub fn total_calls(&self) -> u32 {
        self.search_calls.load(Ordering::Relaxed) + self.fundamentals_calls.load(Ordering::Relaxed)
    }

    fn by_ticker(&self, ticker: &str) -> Option<&Listing> {
        self.listings.values().find(|l| match l {
            Listing::Found(t, _) | Listing::FundamentalsFail(t) => *t == ticker,
            _ => false,
        })
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search_ticker(&self, name: &str) -> Result<Option<String>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::Relaxed);
        match self.listings.get(name) {
            Some(Listing::Found(ticker, _)) | Some(Listing::FundamentalsFail(ticker)) => {
                Ok(Some(ticker.to_string()))
            }
            Some(Listing::SearchFails) => Err(ProviderError::Network("mock network failure".into())),
            Some(Listing::NotListed) | None => Ok(None),
        }
    }

    async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals, ProviderError> {
        self.fundamentals_calls.fetch_add(1, Ordering::Relaxed);
        match self.by_ticker(ticker) {
            Some(Listing::Found(_, f)) => Ok(*f),
            Some(Listing::FundamentalsFail(_)) => Err(ProviderError::Timeout),
            _ => Err(ProviderError::DataNotAvailable(ticker.to_string())),
        }
    }
}
