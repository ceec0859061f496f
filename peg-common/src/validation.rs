//! Configuration validation.
//!
//! Catches values that would make a run meaningless (no exchanges to match,
//! zero timeouts) before any network traffic happens.

use thiserror::Error;

use crate::config::{Config, FetchConfig, MarketConfig, ObservabilityConfig, SourcesConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors: Vec<ValidationError> = [
            self.sources.validate(),
            self.fetch.validate(),
            self.market.validate(),
            self.observability.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for SourcesConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.file.as_os_str().is_empty() {
            return Err(ValidationError::MissingField {
                field: "sources.file".into(),
            });
        }
        if self.fund_filter.trim().is_empty() {
            return Err(invalid("sources.fund_filter", "must not be empty"));
        }
        Ok(())
    }
}

impl Validate for FetchConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.timeout_secs == 0 {
            return Err(invalid("fetch.timeout_secs", "must be greater than 0"));
        }
        Ok(())
    }
}

impl Validate for MarketConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.exchanges.iter().all(|e| e.trim().is_empty()) {
            return Err(ValidationError::MissingField {
                field: "market.exchanges".into(),
            });
        }
        if self.max_results == 0 {
            return Err(invalid("market.max_results", "must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("market.timeout_secs", "must be greater than 0"));
        }
        if self.requests_per_minute == 0 {
            return Err(invalid("market.requests_per_minute", "must be greater than 0"));
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        const FORMATS: &[&str] = &["json", "pretty"];

        if !LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(invalid(
                "observability.log_level",
                format!("'{}' is not one of {:?}", self.log_level, LEVELS),
            ));
        }
        if !FORMATS.contains(&self.log_format.as_str()) {
            return Err(invalid(
                "observability.log_format",
                format!("'{}' is not one of {:?}", self.log_format, FORMATS),
            ));
        }
        Ok(())
    }
}
