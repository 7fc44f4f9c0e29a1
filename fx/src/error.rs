//! FX error types.

use moneta_common::{CurrencyPair, MonetaryError};
use thiserror::Error;

/// Errors that can occur while looking up or applying rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// Rate not available for the requested currency pair.
    #[error("Rate not available for {0}")]
    RateNotAvailable(CurrencyPair),

    /// A cache policy produced a quote for the wrong pair.
    #[error("Quote for {actual} returned when {expected} was requested")]
    InvalidQuote {
        expected: CurrencyPair,
        actual: CurrencyPair,
    },

    /// Provider returned an error.
    #[error("Rate provider error: {0}")]
    ProviderError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Monetary value error.
    #[error(transparent)]
    Monetary(#[from] MonetaryError),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
