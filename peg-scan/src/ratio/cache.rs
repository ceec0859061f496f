//! Per-run ratio memo.
//!
//! Keyed by the exact stock name as parsed from the page. A stored 0 is a
//! real entry ("computed, no meaningful PEG"), not an absent key.

use serde::Serialize;
use std::collections::HashMap;

/// Ratio cache shared by every fund of one run.
#[derive(Debug, Default)]
pub struct RatioCache {
    ratios: HashMap<String, f64>,
    hits: u64,
    misses: u64,
}

impl RatioCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a ratio, counting the hit or miss.
    pub fn get(&mut self, stock: &str) -> Option<f64> {
        match self.ratios.get(stock) {
            Some(&ratio) => {
                self.hits += 1;
                Some(ratio)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up without touching the counters.
    pub fn peek(&self, stock: &str) -> Option<f64> {
        self.ratios.get(stock).copied()
    }

    /// Store a ratio.
    pub fn insert(&mut self, stock: impl Into<String>, ratio: f64) {
        self.ratios.insert(stock.into(), ratio);
    }

    /// True when the name has an entry.
    pub fn contains(&self, stock: &str) -> bool {
        self.ratios.contains_key(stock)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.ratios.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}
