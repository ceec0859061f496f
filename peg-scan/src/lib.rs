//! PEG Scan Library
//!
//! Computes a weight-averaged Forward PEG for a set of large-cap index funds
//! from their public holdings pages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         FundAggregator                              │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────┐   ┌────────────┐   │
//! │  │ PageFetcher│ → │  Segmenter  │ → │  Parser  │ → │  Ratio     │   │
//! │  │ (scraper)  │   │ anchor + %  │   │  regex   │   │  Resolver  │   │
//! │  └────────────┘   └─────────────┘   └──────────┘   └─────┬──────┘   │
//! │                                                          │          │
//! │                                   RatioCache ◄───────────┤          │
//! │                                   MarketDataProvider ◄───┘          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Holdings segmentation
//! - The page text has no cell separators; the table is found through the
//!   `)NameSectorInstrumentAssets` anchor and sized by the `(N)` before it
//! - The row sequence ends at the N-th `%` sign
//!
//! ## PEG
//! - growth% = (forward EPS − trailing EPS) / trailing EPS × 100
//! - PEG = trailing PE / growth% when growth is positive, otherwise 0
//! - Fund PEG = Σ PEG·weight / Σ weight over the parsed rows
//!
//! ## Failure tiers
//! - Hard: page fetch or segmentation failure (abort or skip the fund)
//! - Soft: anything during ratio resolution (the stock contributes 0)

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod aggregator;
pub mod holdings;
pub mod market;
pub mod page;
pub mod ratio;
pub mod report;
pub mod sources;

pub use aggregator::{
    average_peg, weighted_peg, AnalysisError, FundAggregator, FundError, FundFailure, FundResult,
    PegReport, AVERAGE_LABEL,
};
pub use holdings::{extract_holdings, HoldingRow, HoldingsTable, HoldingsWindow, SegmentError, Sector};
pub use market::{Fundamentals, MarketDataProvider, ProviderError, YahooFinanceAdapter};
pub use page::{FetchError, HttpPageFetcher, PageFetcher, RawPage};
pub use ratio::{CacheStats, RatioCache, RatioOutcome, RatioResolver};
pub use sources::SourceList;
