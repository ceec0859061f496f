//! PEG Common - Shared configuration, validation and logging for the PEG scanner.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Logging setup
//! - Utility functions used by the scanner

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{
    AnalysisConfig, Config, FetchConfig, FundErrorPolicy, MarketConfig, ObservabilityConfig,
    OutputFormat, SourcesConfig,
};
pub use validation::{Validate, ValidationError, ValidationResult};
