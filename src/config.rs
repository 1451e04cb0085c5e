//! Calculator configuration.
//!
//! Settings are read from TOML. Every section and field has a default, so
//! an empty document is a valid configuration. Validation accumulates ALL
//! violations instead of stopping at the first one.
//!
//! # Example
//!
//! ```rust
//! use tally::config::CalculatorConfig;
//!
//! let config = CalculatorConfig::from_toml_str(r#"
//!     [evaluator]
//!     endpoint = "http://calc.internal:3000"
//!     timeout_ms = 2500
//!
//!     [history]
//!     max_entries = 50
//! "#).unwrap();
//!
//! assert_eq!(config.evaluator.calculate_url(), "http://calc.internal:3000/api/calculate");
//! assert_eq!(config.history.max_entries, Some(50));
//! assert_eq!(config.display.max_plain_length, 12);
//! ```

use crate::currency::currency_code;
use crate::display::NumberLocale;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Largest precision an `f64` can meaningfully render.
pub const MAX_SIGNIFICANT_DIGITS: usize = 17;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub evaluator: EvaluatorConfig,
    pub display: DisplayConfig,
    pub history: HistoryConfig,
    pub currency: CurrencyConfig,
}

/// Where and how to reach the evaluation service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub endpoint: String,
    pub calculate_path: String,
    pub plot_path: String,
    /// Deadline for a single request, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000".to_string(),
            calculate_path: "/api/calculate".to_string(),
            plot_path: "/api/plot".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl EvaluatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn calculate_url(&self) -> String {
        join_url(&self.endpoint, &self.calculate_path)
    }

    pub fn plot_url(&self) -> String {
        join_url(&self.endpoint, &self.plot_path)
    }
}

fn join_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub locale: NumberLocale,
    /// Tokens longer than this are shown with `significant_digits`.
    pub max_plain_length: usize,
    pub significant_digits: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            locale: NumberLocale::EnUs,
            max_plain_length: 12,
            significant_digits: 10,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// `None` keeps every entry.
    pub max_entries: Option<usize>,
}

/// Exchange rate service and the initial currency pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    pub endpoint: String,
    pub latest_path: String,
    pub timeout_ms: u64,
    pub base: String,
    pub target: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.frankfurter.app".to_string(),
            latest_path: "/latest".to_string(),
            timeout_ms: 5_000,
            base: "USD".to_string(),
            target: "EUR".to_string(),
        }
    }
}

impl CurrencyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn latest_url(&self) -> String {
        join_url(&self.endpoint, &self.latest_path)
    }
}

/// A single problem found by [`CalculatorConfig::validate`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigViolation {
    #[error("evaluator.endpoint must be an http(s) URL, got '{0}'")]
    InvalidEndpoint(String),

    #[error("evaluator.{field} must start with '/', got '{value}'")]
    InvalidPath { field: &'static str, value: String },

    #[error("evaluator.timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("display.max_plain_length must be greater than zero")]
    ZeroPlainLength,

    #[error("display.significant_digits must be between 1 and {max}, got {value}")]
    SignificantDigitsOutOfRange { value: usize, max: usize },

    #[error("history.max_entries must be greater than zero when set")]
    ZeroHistoryCap,

    #[error("currency.endpoint must be an http(s) URL, got '{0}'")]
    InvalidRateEndpoint(String),

    #[error("currency.timeout_ms must be greater than zero")]
    ZeroRateTimeout,

    #[error("currency.{field} must be a three-letter code, got '{value}'")]
    InvalidCurrency { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {}", join_violations(.0))]
    Invalid(Vec<ConfigViolation>),
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CalculatorConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: CalculatorConfig = toml::from_str(source)?;
        config.check()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let evaluator = &self.evaluator;
        let display = &self.display;
        let currency = &self.currency;

        let checks = vec![
            check(
                evaluator.endpoint.starts_with("http://")
                    || evaluator.endpoint.starts_with("https://"),
                || ConfigViolation::InvalidEndpoint(evaluator.endpoint.clone()),
            ),
            check(evaluator.calculate_path.starts_with('/'), || {
                ConfigViolation::InvalidPath {
                    field: "calculate_path",
                    value: evaluator.calculate_path.clone(),
                }
            }),
            check(evaluator.plot_path.starts_with('/'), || {
                ConfigViolation::InvalidPath {
                    field: "plot_path",
                    value: evaluator.plot_path.clone(),
                }
            }),
            check(evaluator.timeout_ms > 0, || ConfigViolation::ZeroTimeout),
            check(display.max_plain_length > 0, || {
                ConfigViolation::ZeroPlainLength
            }),
            check(
                (1..=MAX_SIGNIFICANT_DIGITS).contains(&display.significant_digits),
                || ConfigViolation::SignificantDigitsOutOfRange {
                    value: display.significant_digits,
                    max: MAX_SIGNIFICANT_DIGITS,
                },
            ),
            check(self.history.max_entries != Some(0), || {
                ConfigViolation::ZeroHistoryCap
            }),
            check(
                currency.endpoint.starts_with("http://")
                    || currency.endpoint.starts_with("https://"),
                || ConfigViolation::InvalidRateEndpoint(currency.endpoint.clone()),
            ),
            check(currency.timeout_ms > 0, || ConfigViolation::ZeroRateTimeout),
            check(currency_code(&currency.base).is_ok(), || {
                ConfigViolation::InvalidCurrency {
                    field: "base",
                    value: currency.base.clone(),
                }
            }),
            check(currency_code(&currency.target).is_ok(), || {
                ConfigViolation::InvalidCurrency {
                    field: "target",
                    value: currency.target.clone(),
                }
            }),
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn check(&self) -> Result<(), ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(()),
            Validation::Failure(violations) => {
                Err(ConfigError::Invalid(violations.iter().cloned().collect()))
            }
        }
    }
}

fn check<F>(ok: bool, violation: F) -> Validation<(), NonEmptyVec<ConfigViolation>>
where
    F: FnOnce() -> ConfigViolation,
{
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}
