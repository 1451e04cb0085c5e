//! Currency conversion.
//!
//! Rates come from an external service behind the [`RateSource`] trait and
//! are quoted against one base currency at a time. Changing the source
//! currency refetches the table for the new base; changing the target only
//! looks up a different rate.
//!
//! # Example
//!
//! ```rust
//! use tally::currency::{CurrencyConverter, RateTable};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let table = RateTable::new("USD", [("EUR".to_string(), 0.5)]);
//! let mut converter = CurrencyConverter::new(table);
//! converter.load().await.unwrap();
//!
//! let conversion = converter.convert("12.5").unwrap();
//! assert_eq!(conversion.result_text(), "6.25");
//! assert_eq!(conversion.rate_info(), "1 USD = 0.5 EUR");
//! # }
//! ```

mod error;
pub mod http;

pub use error::CurrencyError;
pub use http::HttpRateSource;

use crate::config::CurrencyConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE: &str = "USD";
pub const DEFAULT_TARGET: &str = "EUR";

/// Normalize a currency code to upper case, rejecting anything that is not
/// three ASCII letters.
pub fn currency_code(code: &str) -> Result<String, CurrencyError> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(CurrencyError::InvalidCode(code.to_string()))
    }
}

/// Read the leading number of `text`. Anything unreadable counts as zero.
pub fn parse_amount(text: &str) -> f64 {
    let text = text.trim_start();
    let numeric_len = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(text.len());

    (1..=numeric_len)
        .rev()
        .find_map(|len| text[..len].parse::<f64>().ok())
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0)
}

/// Rates quoted against one base currency. The base itself is always 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn new(base: impl Into<String>, rates: impl IntoIterator<Item = (String, f64)>) -> Self {
        let base = base.into();
        let mut rates: BTreeMap<String, f64> = rates
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .collect();
        rates.insert(base.clone(), 1.0);
        Self { base, rates }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rate(&self, to: &str) -> Option<f64> {
        self.rates.get(to).copied()
    }

    /// Every quoted currency, base included, in alphabetical order.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// A source of exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Latest rates quoted against `base`.
    async fn latest(&self, base: &str) -> Result<RateTable, CurrencyError>;
}

#[async_trait]
impl<R: RateSource + ?Sized> RateSource for Box<R> {
    async fn latest(&self, base: &str) -> Result<RateTable, CurrencyError> {
        (**self).latest(base).await
    }
}

#[async_trait]
impl<R: RateSource + ?Sized> RateSource for std::sync::Arc<R> {
    async fn latest(&self, base: &str) -> Result<RateTable, CurrencyError> {
        (**self).latest(base).await
    }
}

/// A fixed table answers for its own base, rebased through the quoted
/// rates for any other currency it lists.
#[async_trait]
impl RateSource for RateTable {
    async fn latest(&self, base: &str) -> Result<RateTable, CurrencyError> {
        if base == self.base {
            return Ok(self.clone());
        }
        let pivot = self.rate(base).ok_or_else(|| CurrencyError::UnknownCurrency {
            from: self.base.clone(),
            to: base.to_string(),
        })?;
        let rebased = self
            .rates
            .iter()
            .map(|(code, rate)| (code.clone(), rate / pivot));
        Ok(RateTable::new(base, rebased))
    }
}

/// One finished conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub rate: f64,
    pub result: f64,
}

impl Conversion {
    /// The converted amount with two decimals.
    pub fn result_text(&self) -> String {
        format!("{:.2}", self.result)
    }

    /// "1 USD = 0.92 EUR"
    pub fn rate_info(&self) -> String {
        format!("1 {} = {} {}", self.from, self.rate, self.to)
    }
}

/// Converts amounts between a source and a target currency, holding the
/// rate table for the current source.
#[derive(Debug)]
pub struct CurrencyConverter<R> {
    source: R,
    from: String,
    to: String,
    table: Option<RateTable>,
}

impl<R: RateSource> CurrencyConverter<R> {
    /// Converter from USD to EUR. No rates are fetched until
    /// [`load`](Self::load).
    pub fn new(source: R) -> Self {
        Self {
            source,
            from: DEFAULT_BASE.to_string(),
            to: DEFAULT_TARGET.to_string(),
            table: None,
        }
    }

    pub fn from_config(source: R, config: &CurrencyConfig) -> Result<Self, CurrencyError> {
        Ok(Self {
            source,
            from: currency_code(&config.base)?,
            to: currency_code(&config.target)?,
            table: None,
        })
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    /// The currency amounts are converted from.
    pub fn base(&self) -> &str {
        &self.from
    }

    pub fn target(&self) -> &str {
        &self.to
    }

    pub fn table(&self) -> Option<&RateTable> {
        self.table.as_ref()
    }

    /// Fetch rates for the source currency unless they are already held.
    pub async fn load(&mut self) -> Result<&RateTable, CurrencyError> {
        if self.table.as_ref().map(RateTable::base) != Some(self.from.as_str()) {
            let table = self.fetch(&self.from).await?;
            self.table = Some(table);
        }
        self.table.as_ref().ok_or(CurrencyError::NotLoaded)
    }

    /// Switch the source currency and refetch rates for it. On failure the
    /// previous source and table stay in place.
    pub async fn set_base(&mut self, from: &str) -> Result<(), CurrencyError> {
        let from = currency_code(from)?;
        if self.table.as_ref().map(RateTable::base) == Some(from.as_str()) {
            self.from = from;
            return Ok(());
        }

        let table = self.fetch(&from).await?;
        info!(from = %from, currencies = table.len(), "Rebased exchange rates");
        self.from = from;
        self.table = Some(table);
        Ok(())
    }

    pub fn set_target(&mut self, to: &str) -> Result<(), CurrencyError> {
        self.to = currency_code(to)?;
        Ok(())
    }

    /// Convert `amount_text` from the source to the target currency.
    pub fn convert(&self, amount_text: &str) -> Result<Conversion, CurrencyError> {
        let table = self.table.as_ref().ok_or(CurrencyError::NotLoaded)?;
        let rate = table
            .rate(&self.to)
            .ok_or_else(|| CurrencyError::UnknownCurrency {
                from: table.base().to_string(),
                to: self.to.clone(),
            })?;

        let amount = parse_amount(amount_text);
        debug!(from = %self.from, to = %self.to, amount, rate, "Converting");
        Ok(Conversion {
            from: table.base().to_string(),
            to: self.to.clone(),
            amount,
            rate,
            result: amount * rate,
        })
    }

    async fn fetch(&self, base: &str) -> Result<RateTable, CurrencyError> {
        self.source.latest(base).await.map_err(|err| {
            warn!(base = %base, error = %err, "Exchange rate fetch failed");
            err
        })
    }
}
