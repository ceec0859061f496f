//! Fund aggregation.
//!
//! Drives the whole run: for each selected fund, fetch → segment → parse →
//! resolve every row → weight-average; then average the rounded fund values.
//! Everything is awaited in order; nothing runs concurrently.

use peg_common::config::{Config, FundErrorPolicy};
use peg_common::logging::generate_run_id;
use peg_common::util::round2;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use crate::holdings::{extract_holdings, HoldingsTable, SegmentError};
use crate::market::{MarketDataProvider, YahooFinanceAdapter};
use crate::page::{FetchError, HttpPageFetcher, PageFetcher};
use crate::ratio::{CacheStats, RatioCache, RatioResolver};
use crate::sources::SourceList;

/// Label of the synthetic average row.
pub const AVERAGE_LABEL: &str = "Average PEG";

// ============================================================================
// Errors
// ============================================================================

/// Hard failure for a single fund.
#[derive(Debug, Error)]
pub enum FundError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// Failure of a whole run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A fund failed under the abort policy
    #[error("fund #{index} ({address}) failed: {source}")]
    Fund {
        index: usize,
        address: String,
        #[source]
        source: FundError,
    },
}

// ============================================================================
// Results
// ============================================================================

/// PEG of one fund.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundResult {
    /// Position in the source list
    pub index: usize,
    /// Page title
    pub title: String,
    /// Weighted PEG, rounded to 2 places
    pub peg: f64,
    /// Rows parsed from the page
    pub holdings: usize,
    /// Rows whose ratio resolved (cached, computed or no-growth)
    pub resolved: usize,
    /// Observed weight sum used as the denominator
    pub weight_sum: f64,
}

/// A fund skipped under the skip policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundFailure {
    pub index: usize,
    pub address: String,
    pub error: String,
}

/// Output of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PegReport {
    /// One row per processed fund, in source order
    pub funds: Vec<FundResult>,
    /// Mean of the rounded fund PEGs, rounded to 2 places
    pub average: f64,
    /// Funds that failed hard (skip policy only)
    pub failures: Vec<FundFailure>,
    /// Ratio cache statistics at the end of the run
    pub cache: CacheStats,
}

/// Weighted PEG: `Σ ratio·weight / Σ weight`, or 0 when the weights sum to 0.
pub fn weighted_peg<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (peg_sum, weight_sum) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(p, w), (ratio, weight)| (p + ratio * weight, w + weight));

    if weight_sum == 0.0 {
        0.0
    } else {
        peg_sum / weight_sum
    }
}

/// Mean of fund PEGs rounded to 2 places; 0 with no funds.
pub fn average_peg(pegs: &[f64]) -> f64 {
    if pegs.is_empty() {
        return 0.0;
    }
    round2(pegs.iter().sum::<f64>() / pegs.len() as f64)
}

// ============================================================================
// Aggregator
// ============================================================================

/// Runs the per-fund pipeline over a source list.
pub struct FundAggregator {
    fetcher: Arc<dyn PageFetcher>,
    resolver: RatioResolver,
    fund_filter: String,
    on_fund_error: FundErrorPolicy,
}

impl FundAggregator {
    /// Create an aggregator from explicit collaborators.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        provider: Arc<dyn MarketDataProvider>,
        fund_filter: impl Into<String>,
        on_fund_error: FundErrorPolicy,
    ) -> Self {
        Self {
            fetcher,
            resolver: RatioResolver::new(provider),
            fund_filter: fund_filter.into(),
            on_fund_error,
        }
    }

    /// Create with the HTTP fetcher and Yahoo provider from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpPageFetcher::from_config(&config.fetch)),
            Arc::new(YahooFinanceAdapter::from_config(&config.market)),
            config.sources.fund_filter.clone(),
            config.analysis.on_fund_error,
        )
    }

    /// Analyse every selected fund of `sources`.
    pub async fn run(
        &self,
        sources: &SourceList,
        cache: &mut RatioCache,
    ) -> Result<PegReport, AnalysisError> {
        let span = info_span!("peg_run", run_id = %generate_run_id());
        self.run_inner(sources, cache).instrument(span).await
    }

    async fn run_inner(
        &self,
        sources: &SourceList,
        cache: &mut RatioCache,
    ) -> Result<PegReport, AnalysisError> {
        let selected = sources.select(&self.fund_filter);
        info!(
            total = sources.len(),
            selected = selected.len(),
            filter = %self.fund_filter,
            provider = self.resolver.provider_name(),
            policy = %self.on_fund_error,
            "Starting PEG analysis"
        );

        let mut funds = Vec::with_capacity(selected.len());
        let mut failures = Vec::new();

        for (position, source) in selected.iter().enumerate() {
            info!(
                index = source.index,
                "Processing fund {}/{}",
                position + 1,
                selected.len()
            );

            match self.analyze_fund(source.index, source.address, cache).await {
                Ok(result) => {
                    info!(
                        title = %result.title,
                        peg = result.peg,
                        holdings = result.holdings,
                        resolved = result.resolved,
                        "Fund analysed"
                    );
                    funds.push(result);
                }
                Err(e) => match self.on_fund_error {
                    FundErrorPolicy::Abort => {
                        error!(index = source.index, address = %source.address, error = %e, "Fund failed, aborting run");
                        return Err(AnalysisError::Fund {
                            index: source.index,
                            address: source.address.to_string(),
                            source: e,
                        });
                    }
                    FundErrorPolicy::Skip => {
                        warn!(index = source.index, address = %source.address, error = %e, "Fund failed, skipping");
                        failures.push(FundFailure {
                            index: source.index,
                            address: source.address.to_string(),
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        let pegs: Vec<f64> = funds.iter().map(|f| f.peg).collect();
        let average = average_peg(&pegs);
        let stats = cache.stats();

        info!(
            funds = funds.len(),
            failed = failures.len(),
            average,
            cache_entries = stats.entries,
            cache_hits = stats.hits,
            "PEG analysis complete"
        );

        Ok(PegReport {
            funds,
            average,
            failures,
            cache: stats,
        })
    }

    /// Fetch, extract and price one fund.
    pub async fn analyze_fund(
        &self,
        index: usize,
        address: &str,
        cache: &mut RatioCache,
    ) -> Result<FundResult, FundError> {
        let page = self.fetcher.fetch(address).await?;
        let table = extract_holdings(&page.body)?;
        Ok(self.price_table(index, page.title, &table, cache).await)
    }

    /// Resolve every row in order and weight-average the ratios.
    pub async fn price_table(
        &self,
        index: usize,
        title: String,
        table: &HoldingsTable,
        cache: &mut RatioCache,
    ) -> FundResult {
        let mut pairs = Vec::with_capacity(table.len());
        let mut resolved = 0;

        for row in table {
            let outcome = self.resolver.resolve(&row.stock, cache).await;
            if outcome.is_resolved() {
                resolved += 1;
            }
            pairs.push((outcome.value(), row.weight_percent));
        }

        FundResult {
            index,
            title,
            peg: round2(weighted_peg(pairs)),
            holdings: table.len(),
            resolved,
            weight_sum: table.total_weight(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_peg_example() {
        let peg = weighted_peg([(2.0, 60.0), (0.5, 40.0)]);
        assert!((peg - 1.4).abs() < 1e-12);
        assert_eq!(round2(peg), 1.4);
    }

    #[test]
    fn test_weighted_peg_normalises_by_observed_weight() {
        // Weights sum to 50, not 100
        let peg = weighted_peg([(1.0, 25.0), (3.0, 25.0)]);
        assert_eq!(peg, 2.0);
    }

    #[test]
    fn test_weighted_peg_empty_or_zero_weight() {
        assert_eq!(weighted_peg(std::iter::empty()), 0.0);
        assert_eq!(weighted_peg([(5.0, 0.0)]), 0.0);
    }

    #[test]
    fn test_all_zero_ratios() {
        assert_eq!(weighted_peg([(0.0, 70.0), (0.0, 30.0)]), 0.0);
    }

    #[test]
    fn test_average_includes_zero_funds() {
        assert_eq!(average_peg(&[1.4, 0.0]), 0.7);
        assert_eq!(average_peg(&[1.23, 4.56, 0.0]), 1.93);
        assert_eq!(average_peg(&[]), 0.0);
    }

    #[test]
    fn test_average_rounding_on_near_ties() {
        // 1.41 / 2 is stored just below 0.705
        assert_eq!(average_peg(&[1.41, 0.0]), 0.7);
        // 0.125 is an exact tie and goes to even
        assert_eq!(average_peg(&[0.25, 0.0]), 0.12);
    }

    #[test]
    fn test_analysis_error_display() {
        let err = AnalysisError::Fund {
            index: 3,
            address: "https://x/large".into(),
            source: FundError::Segment(SegmentError::BoundaryNotFound),
        };
        let msg = err.to_string();
        assert!(msg.contains("#3"));
        assert!(msg.contains("boundary not found"));
    }
}
