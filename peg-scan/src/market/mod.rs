//! Market-data provider abstraction.
//!
//! The resolver only needs two capabilities from a provider: name → ticker
//! search restricted to a set of exchanges, and ticker → fundamentals.

mod rate_limiter;
mod yahoo;

pub use rate_limiter::{shared_limiter, RateLimiter, SharedRateLimiter};
pub use yahoo::YahooFinanceAdapter;

use async_trait::async_trait;
use std::fmt;

// ============================================================================
// Fundamentals
// ============================================================================

/// Per-ticker ratios used by the PEG computation.
///
/// Any field may be missing at the provider; missing reads as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fundamentals {
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
}

impl Fundamentals {
    pub fn trailing_pe(&self) -> f64 {
        self.trailing_pe.unwrap_or(0.0)
    }

    pub fn forward_pe(&self) -> f64 {
        self.forward_pe.unwrap_or(0.0)
    }

    pub fn trailing_eps(&self) -> f64 {
        self.trailing_eps.unwrap_or(0.0)
    }

    pub fn forward_eps(&self) -> f64 {
        self.forward_eps.unwrap_or(0.0)
    }
}

// ============================================================================
// Provider Error
// ============================================================================

/// Errors specific to market-data providers.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed)
    Network(String),
    /// Request exceeded the configured timeout
    Timeout,
    /// Rate limit exceeded
    RateLimited { retry_after_secs: Option<u64> },
    /// Session/crumb rejected
    Auth(String),
    /// Provider has no data for the symbol
    DataNotAvailable(String),
    /// Response could not be decoded
    InvalidResponse(String),
    /// Internal provider error
    Internal(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Timeout => write!(f, "Request timed out"),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after_secs {
                    write!(f, ", retry after {} seconds", secs)?;
                }
                Ok(())
            }
            Self::Auth(msg) => write!(f, "Authentication error: {}", msg),
            Self::DataNotAvailable(msg) => write!(f, "Data not available: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Check if the error is transient (a later call may succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::RateLimited { .. } | Self::Auth(_)
        )
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Trait for market-data providers.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Get the provider name (e.g., "yahoo")
    fn name(&self) -> &'static str;

    /// Resolve a stock name to the first ticker listed on an accepted exchange.
    ///
    /// `Ok(None)` means the search ran but nothing matched.
    async fn search_ticker(&self, name: &str) -> Result<Option<String>, ProviderError>;

    /// Fetch PE/EPS fundamentals for a ticker.
    async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals, ProviderError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_read_as_zero() {
        let f = Fundamentals {
            trailing_pe: Some(20.0),
            ..Default::default()
        };
        assert_eq!(f.trailing_pe(), 20.0);
        assert_eq!(f.forward_pe(), 0.0);
        assert_eq!(f.trailing_eps(), 0.0);
        assert_eq!(f.forward_eps(), 0.0);
    }

    #[test]
    fn test_provider_error_recoverable() {
        assert!(ProviderError::Network("reset".into()).is_recoverable());
        assert!(ProviderError::Timeout.is_recoverable());
        assert!(ProviderError::RateLimited { retry_after_secs: None }.is_recoverable());
        assert!(!ProviderError::DataNotAvailable("delisted".into()).is_recoverable());
        assert!(!ProviderError::InvalidResponse("bad json".into()).is_recoverable());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(err.to_string().contains("30 seconds"));
        assert_eq!(ProviderError::Timeout.to_string(), "Request timed out");
    }
}
