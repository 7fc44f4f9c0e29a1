//! Exchange rate provider trait and implementations.

use async_trait::async_trait;
use dashmap::DashMap;
use moneta_common::{Currency, CurrencyPair};
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Source of exchange rates.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Units of `pair.to` bought by one unit of `pair.from`.
    async fn exchange_rate(&self, pair: &CurrencyPair) -> FxResult<f64>;
}

/// Rates per US dollar used to seed [`FixedRateTable::with_defaults`].
pub const DEFAULT_USD_RATES: &[(&str, f64)] = &[
    ("AUD", 1.52),
    ("BHD", 0.376),
    ("BRL", 4.97),
    ("CAD", 1.36),
    ("CHF", 0.88),
    ("CNY", 7.24),
    ("DKK", 6.87),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("HKD", 7.82),
    ("INR", 83.2),
    ("JPY", 149.5),
    ("KWD", 0.308),
    ("MXN", 17.1),
    ("NOK", 10.6),
    ("NZD", 1.64),
    ("SEK", 10.45),
    ("SGD", 1.34),
    ("ZAR", 18.6),
];

/// Hard-coded rate table keyed against a single anchor currency.
///
/// Cross rates are derived through the anchor: `A/B = rate(B) / rate(A)`.
pub struct FixedRateTable {
    anchor: Currency,
    rates: DashMap<Currency, f64>,
}

impl FixedRateTable {
    /// Create an empty table. Only the anchor itself is priced.
    pub fn new(anchor: Currency) -> Self {
        Self {
            anchor,
            rates: DashMap::new(),
        }
    }

    /// Table anchored on USD, seeded with [`DEFAULT_USD_RATES`].
    pub fn with_defaults() -> Self {
        let table = Self::new(Currency::usd());
        for (code, rate) in DEFAULT_USD_RATES {
            table.rates.insert(Currency::new(*code), *rate);
        }
        table
    }

    /// The anchor currency.
    pub fn anchor(&self) -> &Currency {
        &self.anchor
    }

    /// Set how many units of `currency` one anchor unit buys.
    pub fn set_rate(&self, currency: Currency, per_anchor: f64) -> FxResult<()> {
        if !per_anchor.is_finite() || per_anchor <= 0.0 {
            return Err(FxError::ProviderError(format!(
                "Rejected rate {} for {}",
                per_anchor, currency
            )));
        }
        if currency == self.anchor {
            return Err(FxError::ProviderError(format!(
                "{} is the anchor currency",
                currency
            )));
        }
        self.rates.insert(currency, per_anchor);
        Ok(())
    }

    /// Units of `currency` per anchor unit.
    pub fn rate_per_anchor(&self, currency: &Currency) -> Option<f64> {
        if *currency == self.anchor {
            return Some(1.0);
        }
        self.rates.get(currency).map(|r| *r)
    }

    /// Every priced currency, anchor included, sorted by code.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = self.rates.iter().map(|r| r.key().clone()).collect();
        currencies.push(self.anchor.clone());
        currencies.sort();
        currencies
    }
}

impl Default for FixedRateTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl ExchangeRateProvider for FixedRateTable {
    fn name(&self) -> &str {
        "FIXED_TABLE"
    }

    async fn exchange_rate(&self, pair: &CurrencyPair) -> FxResult<f64> {
        if pair.is_identity() {
            return Ok(1.0);
        }

        let from = self.rate_per_anchor(&pair.from);
        let to = self.rate_per_anchor(&pair.to);

        match (from, to) {
            (Some(from), Some(to)) => Ok(to / from),
            _ => {
                debug!(pair = %pair, "No table rate for pair");
                Err(FxError::RateNotAvailable(pair.clone()))
            }
        }
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: DashMap<CurrencyPair, f64>,
    calls: std::sync::atomic::AtomicUsize,
    failing: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: DashMap::new(),
            calls: Default::default(),
            failing: Default::default(),
        }
    }

    /// Set a rate for a currency pair.
    pub fn set_rate(&self, pair: CurrencyPair, rate: f64) {
        self.rates.insert(pair, rate);
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of `exchange_rate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl ExchangeRateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exchange_rate(&self, pair: &CurrencyPair) -> FxResult<f64> {
        use std::sync::atomic::Ordering;

        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FxError::ProviderError(format!("{} is unavailable", self.name)));
        }

        self.rates
            .get(pair)
            .map(|r| *r)
            .ok_or_else(|| FxError::RateNotAvailable(pair.clone()))
    }
}
