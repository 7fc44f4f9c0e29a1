//! Error types for monetary value operations.

use crate::Currency;
use thiserror::Error;

/// Errors raised by the monetary value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonetaryError {
    /// Code is not in the ISO 4217 table.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Operation mixed two currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    /// Result does not fit in the fixed-point representation.
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Amount text could not be parsed.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount carries more fractional digits than the currency allows.
    #[error("{currency} allows at most {max_places} decimal places")]
    ExcessPrecision { currency: Currency, max_places: u32 },

    /// Conversion rate is not a finite, strictly positive number.
    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// Currency pair text could not be parsed.
    #[error("Invalid currency pair: {0}")]
    InvalidPair(String),

    /// Allocation ratios cannot split an amount.
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),
}

impl MonetaryError {
    /// Get error code for logs and machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            MonetaryError::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            MonetaryError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            MonetaryError::Overflow(_) => "OVERFLOW",
            MonetaryError::InvalidAmount(_) => "INVALID_AMOUNT",
            MonetaryError::ExcessPrecision { .. } => "EXCESS_PRECISION",
            MonetaryError::InvalidRate(_) => "INVALID_RATE",
            MonetaryError::InvalidPair(_) => "INVALID_PAIR",
            MonetaryError::InvalidAllocation(_) => "INVALID_ALLOCATION",
        }
    }
}

/// Result type alias for monetary operations.
pub type MonetaryResult<T> = std::result::Result<T, MonetaryError>;
