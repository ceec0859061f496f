//! Per-stock PEG resolution.
//!
//! name → ticker → fundamentals → `trailingPE / growth%`, memoised per run.
//! Every failure degrades to a ratio of 0; `RatioOutcome` keeps the cause
//! visible to callers and logs, while `value()` folds it away for the sum.

mod cache;

pub use cache::{CacheStats, RatioCache};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::market::{Fundamentals, MarketDataProvider, ProviderError};

/// Result of resolving one stock.
#[derive(Debug, Clone, PartialEq)]
pub enum RatioOutcome {
    /// Served from the run cache (may be 0)
    Cached(f64),
    /// Freshly computed positive-growth ratio, now cached
    Computed(f64),
    /// Growth was zero or negative; cached as 0
    NoGrowth,
    /// Trailing EPS was 0; not cached
    ZeroEarnings,
    /// No ticker on an accepted exchange; not cached
    Unresolved,
    /// Provider failure; not cached, retried on a later call
    Failed(String),
}

impl RatioOutcome {
    /// Ratio used in the weighted sum.
    pub fn value(&self) -> f64 {
        match self {
            Self::Cached(v) | Self::Computed(v) => *v,
            Self::NoGrowth | Self::ZeroEarnings | Self::Unresolved | Self::Failed(_) => 0.0,
        }
    }

    /// True when a real ratio (including a cached one) was produced.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Cached(_) | Self::Computed(_) | Self::NoGrowth)
    }
}

impl fmt::Display for RatioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached(v) => write!(f, "cached {:.4}", v),
            Self::Computed(v) => write!(f, "computed {:.4}", v),
            Self::NoGrowth => write!(f, "no growth"),
            Self::ZeroEarnings => write!(f, "zero trailing EPS"),
            Self::Unresolved => write!(f, "no ticker"),
            Self::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Earnings growth in percent and the PEG it implies.
///
/// `None` when trailing EPS is 0 (growth undefined).
pub fn peg_from_fundamentals(f: &Fundamentals) -> Option<(f64, f64)> {
    let eps = f.trailing_eps();
    if eps == 0.0 {
        return None;
    }

    let growth = (f.forward_eps() - eps) / eps * 100.0;
    let peg = if growth > 0.0 {
        f.trailing_pe() / growth
    } else {
        0.0
    };
    Some((growth, peg))
}

/// Resolves stock names to PEG ratios through a market-data provider.
pub struct RatioResolver {
    provider: Arc<dyn MarketDataProvider>,
}

impl RatioResolver {
    /// Create a resolver over a provider.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Provider name, for logging.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Resolve one stock, reading and updating the run cache.
    pub async fn resolve(&self, stock: &str, cache: &mut RatioCache) -> RatioOutcome {
        if let Some(ratio) = cache.get(stock) {
            return RatioOutcome::Cached(ratio);
        }

        let outcome = self.compute(stock).await;
        match outcome {
            RatioOutcome::Computed(ratio) => cache.insert(stock, ratio),
            RatioOutcome::NoGrowth => cache.insert(stock, 0.0),
            _ => {}
        }

        debug!(stock = %stock, outcome = %outcome, "Ratio resolved");
        outcome
    }

    async fn compute(&self, stock: &str) -> RatioOutcome {
        let ticker = match self.provider.search_ticker(stock).await {
            Ok(Some(ticker)) => ticker,
            Ok(None) => return RatioOutcome::Unresolved,
            Err(e) => return provider_failure(stock, e),
        };

        let fundamentals = match self.provider.fundamentals(&ticker).await {
            Ok(f) => f,
            Err(e) => return provider_failure(stock, e),
        };

        match peg_from_fundamentals(&fundamentals) {
            None => RatioOutcome::ZeroEarnings,
            Some((growth, peg)) if growth > 0.0 && peg.is_finite() => {
                debug!(stock = %stock, ticker = %ticker, growth, peg, "Computed PEG");
                RatioOutcome::Computed(peg)
            }
            Some((growth, _)) if growth.is_finite() => RatioOutcome::NoGrowth,
            Some(_) => RatioOutcome::Failed("non-finite growth".into()),
        }
    }
}

/// Fold a provider error into a soft failure.
///
/// Transient errors are surfaced at `warn` since the stock will be looked up
/// again; missing data is routine and stays at `debug`.
fn provider_failure(stock: &str, error: ProviderError) -> RatioOutcome {
    if error.is_recoverable() {
        warn!(stock = %stock, error = %error, "Transient provider failure, ratio counted as 0");
    } else {
        debug!(stock = %stock, error = %error, "No usable fundamentals");
    }
    RatioOutcome::Failed(error.to_string())
}
