//! Currency conversion error types.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CurrencyError {
    #[error("'{0}' is not a three-letter currency code")]
    InvalidCode(String),

    #[error("Exchange rates have not been loaded")]
    NotLoaded,

    #[error("No exchange rate from {from} to {to}")]
    UnknownCurrency { from: String, to: String },

    #[error("Rate service error ({status})")]
    Server { status: u16 },

    #[error("Transport failure: {0}")]
    Transport(String),
}

impl CurrencyError {
    /// Whether retrying the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Transport(_))
    }
}
