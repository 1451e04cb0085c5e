//! HTTP client for a Frankfurter-style exchange rate service.

use super::{currency_code, CurrencyError, RateSource, RateTable};
use crate::config::CurrencyConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Body of `GET /latest?from=USD`.
#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

/// Rate source that reads `GET {endpoint}{latest_path}?from=BASE`.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: Client,
    latest_url: String,
}

impl HttpRateSource {
    pub fn new(config: &CurrencyConfig) -> Result<Self, CurrencyError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CurrencyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            latest_url: config.latest_url(),
        })
    }

    pub fn latest_url(&self) -> &str {
        &self.latest_url
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    #[tracing::instrument(skip(self))]
    async fn latest(&self, base: &str) -> Result<RateTable, CurrencyError> {
        let base = currency_code(base)?;
        let url = format!("{}?from={}", self.latest_url, base);
        debug!(%url, "Fetching exchange rates");

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CurrencyError::Server {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        let latest: LatestRates = serde_json::from_str(&body)
            .map_err(|e| CurrencyError::Transport(format!("Malformed response: {e}")))?;
        Ok(RateTable::new(base, latest.rates))
    }
}

fn transport(err: reqwest::Error) -> CurrencyError {
    CurrencyError::Transport(err.to_string())
}
