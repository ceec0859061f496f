//! Configuration management for the PEG scanner.
//!
//! The scanner reads a single configuration file at `~/.pegscan/config.json`.
//! Every field has a default, so a missing file (or a partial one) is fine.
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (applied by the binary)
//! 2. Environment variables (PEG_* prefix)
//! 3. Explicit config file values
//! 4. Default values
//!
//! # Environment Variable Mapping
//!
//! - `PEG_SOURCES_FILE` → sources.file
//! - `PEG_FUND_FILTER` → sources.fund_filter
//! - `PEG_ON_FUND_ERROR` → analysis.on_fund_error
//! - `PEG_OUTPUT` → analysis.output
//! - `PEG_MARKET_TIMEOUT_SECS` → market.timeout_secs
//! - `PEG_LOG_LEVEL` → observability.log_level
//! - `PEG_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".pegscan"),
        |dirs| dirs.home_dir().join(".pegscan"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

// ============================================================================
// Sources
// ============================================================================

/// Where the list of fund pages comes from and which of them are analysed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Text file with one page address per line
    #[serde(default = "default_sources_file")]
    pub file: PathBuf,

    /// Case-insensitive token an address must contain to be analysed
    #[serde(default = "default_fund_filter")]
    pub fund_filter: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            file: default_sources_file(),
            fund_filter: default_fund_filter(),
        }
    }
}

fn default_sources_file() -> PathBuf {
    PathBuf::from("url_list.txt")
}

fn default_fund_filter() -> String {
    "large".into()
}

// ============================================================================
// Page Fetching
// ============================================================================

/// Holdings page fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with page requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

// ============================================================================
// Market Data
// ============================================================================

/// Market-data provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Exchange codes a search candidate must carry to be accepted
    #[serde(default = "default_exchanges")]
    pub exchanges: Vec<String>,

    /// Maximum number of search candidates inspected per name
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_market_timeout")]
    pub timeout_secs: u64,

    /// Proactive throttle for provider requests
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// User-Agent header sent with provider requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            exchanges: default_exchanges(),
            max_results: default_max_results(),
            timeout_secs: default_market_timeout(),
            requests_per_minute: default_requests_per_minute(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_exchanges() -> Vec<String> {
    vec!["NSI".into(), "NSE".into()]
}

fn default_max_results() -> usize {
    5
}

fn default_market_timeout() -> u64 {
    15
}

fn default_requests_per_minute() -> u32 {
    120
}

// ============================================================================
// Analysis
// ============================================================================

/// What to do when one fund's page cannot be fetched or segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FundErrorPolicy {
    /// Stop the whole run at the first failing fund
    #[default]
    Abort,
    /// Record the failure and continue with the remaining funds
    Skip,
}

impl FromStr for FundErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown fund error policy: {other}")),
        }
    }
}

impl fmt::Display for FundErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned two-column table
    #[default]
    Text,
    /// Pretty-printed JSON document
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "table" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Analysis run settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Hard-failure policy for a single fund
    #[serde(default)]
    pub on_fund_error: FundErrorPolicy,

    /// Report output format
    #[serde(default)]
    pub output: OutputFormat,
}

// ============================================================================
// Observability
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Fund page list
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Holdings page fetching
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Market-data provider
    #[serde(default)]
    pub market: MarketConfig,

    /// Run policy and output
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration (default path or `path`) with environment overrides applied.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(file) = lookup("PEG_SOURCES_FILE") {
            self.sources.file = PathBuf::from(file);
        }
        if let Some(filter) = lookup("PEG_FUND_FILTER") {
            self.sources.fund_filter = filter;
        }
        if let Some(policy) = lookup("PEG_ON_FUND_ERROR") {
            match policy.parse() {
                Ok(p) => self.analysis.on_fund_error = p,
                Err(e) => tracing::warn!(error = %e, "Ignoring PEG_ON_FUND_ERROR"),
            }
        }
        if let Some(output) = lookup("PEG_OUTPUT") {
            match output.parse() {
                Ok(o) => self.analysis.output = o,
                Err(e) => tracing::warn!(error = %e, "Ignoring PEG_OUTPUT"),
            }
        }
        if let Some(secs) = lookup("PEG_MARKET_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(s) => self.market.timeout_secs = s,
                Err(e) => tracing::warn!(value = %secs, error = %e, "Ignoring PEG_MARKET_TIMEOUT_SECS"),
            }
        }
        if let Some(level) = lookup("PEG_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("PEG_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
