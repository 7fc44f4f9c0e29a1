//! Conversion-rate quotes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::currency::Currency;
use crate::error::{MonetaryError, MonetaryResult};
use crate::money::MoneyAmount;
use crate::pair::CurrencyPair;
use crate::time::{elapsed_since, Timestamp};

/// A conversion rate for a currency pair, observed at a point in time.
///
/// One unit of `pair.from` buys `rate` units of `pair.to`. The rate is
/// always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuoteRepr")]
pub struct ConversionRateQuote {
    pair: CurrencyPair,
    rate: Decimal,
    timestamp: Timestamp,
}

#[derive(Deserialize)]
struct QuoteRepr {
    pair: CurrencyPair,
    rate: Decimal,
    timestamp: Timestamp,
}

impl TryFrom<QuoteRepr> for ConversionRateQuote {
    type Error = MonetaryError;

    fn try_from(repr: QuoteRepr) -> Result<Self, Self::Error> {
        Self::new(repr.pair, repr.rate, repr.timestamp)
    }
}

impl ConversionRateQuote {
    /// Create a new quote.
    pub fn new(pair: CurrencyPair, rate: Decimal, timestamp: Timestamp) -> MonetaryResult<Self> {
        if rate <= Decimal::ZERO {
            return Err(MonetaryError::InvalidRate(rate.to_string()));
        }
        Ok(Self {
            pair,
            rate,
            timestamp,
        })
    }

    /// Create from a primitive `f64` rate, as returned by rate providers.
    pub fn from_f64(pair: CurrencyPair, rate: f64, timestamp: Timestamp) -> MonetaryResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(MonetaryError::InvalidRate(rate.to_string()));
        }
        // Display yields the shortest text that round-trips to the same f64.
        let decimal = Decimal::from_str(&rate.to_string())
            .map_err(|_| MonetaryError::InvalidRate(rate.to_string()))?;
        Self::new(pair, decimal, timestamp)
    }

    /// Rate-1 quote converting a currency to itself.
    pub fn identity(currency: Currency, timestamp: Timestamp) -> Self {
        Self {
            pair: CurrencyPair::new(currency.clone(), currency),
            rate: Decimal::ONE,
            timestamp,
        }
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Age of the quote at `now`.
    pub fn age(&self, now: Timestamp) -> chrono::Duration {
        elapsed_since(self.timestamp, now)
    }

    /// Whether the quote is strictly older than `max_age` at `now`.
    pub fn is_older_than(&self, max_age: chrono::Duration, now: Timestamp) -> bool {
        self.age(now) > max_age
    }

    /// Quote for the inverse pair at the same timestamp.
    pub fn invert(&self) -> MonetaryResult<Self> {
        let inverse = Decimal::ONE
            .checked_div(self.rate)
            .ok_or_else(|| MonetaryError::InvalidRate(self.rate.to_string()))?;
        Self::new(self.pair.inverse(), inverse, self.timestamp)
    }

    /// Convert an amount in `pair.from` into `pair.to`.
    ///
    /// The result is rounded half away from zero to the target currency's
    /// minor units.
    pub fn convert(&self, amount: &MoneyAmount) -> MonetaryResult<MoneyAmount> {
        if amount.currency() != &self.pair.from {
            return Err(MonetaryError::CurrencyMismatch {
                expected: self.pair.from.clone(),
                actual: amount.currency().clone(),
            });
        }

        let value = amount
            .to_decimal()
            .checked_mul(self.rate)
            .ok_or(MonetaryError::Overflow("convert"))?;
        MoneyAmount::from_decimal(value, self.pair.to.clone())
    }
}

impl fmt::Display for ConversionRateQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} ({})", self.pair, self.rate, self.timestamp.to_rfc3339())
    }
}
