//! Cache policies backed by an [`ExchangeRateProvider`].

use async_trait::async_trait;
use chrono::Duration;
use moneta_common::{Clock, ConversionRateQuote, CurrencyPair, SystemClock, Timestamp};
use std::sync::Arc;
use tracing::debug;

use crate::cache::CachePolicy;
use crate::error::{FxError, FxResult};
use crate::provider::ExchangeRateProvider;

async fn fetch_quote(
    provider: &dyn ExchangeRateProvider,
    clock: &dyn Clock,
    pair: &CurrencyPair,
) -> FxResult<ConversionRateQuote> {
    let rate = provider.exchange_rate(pair).await?;
    debug!(provider = provider.name(), pair = %pair, rate, "Fetched rate");
    Ok(ConversionRateQuote::from_f64(pair.clone(), rate, clock.now())?)
}

/// Fills misses from a provider. Quotes never go stale.
pub struct ProviderPolicy {
    provider: Arc<dyn ExchangeRateProvider>,
    clock: Arc<dyn Clock>,
}

impl ProviderPolicy {
    pub fn new(provider: Arc<dyn ExchangeRateProvider>) -> Self {
        Self {
            provider,
            clock: Arc::new(SystemClock),
        }
    }

    /// Timestamp quotes with a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl CachePolicy for ProviderPolicy {
    async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
        fetch_quote(self.provider.as_ref(), self.clock.as_ref(), pair).await
    }
}

/// Fills misses from a provider and refetches quotes older than `max_age`.
pub struct RefreshPolicy {
    inner: ProviderPolicy,
    max_age: Duration,
}

impl RefreshPolicy {
    pub fn new(provider: Arc<dyn ExchangeRateProvider>, max_age: Duration) -> Self {
        Self {
            inner: ProviderPolicy::new(provider),
            max_age,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.inner = self.inner.with_clock(clock);
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}

#[async_trait]
impl CachePolicy for RefreshPolicy {
    async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
        self.inner.create(pair).await
    }

    fn needs_refresh(&self, quote: &ConversionRateQuote, now: Timestamp) -> bool {
        quote.is_older_than(self.max_age, now)
    }
}

/// Falls back to inverting the provider's inverse rate when the direct pair
/// is not available. Optionally refreshes like [`RefreshPolicy`].
pub struct InvertPolicy {
    inner: ProviderPolicy,
    max_age: Option<Duration>,
}

impl InvertPolicy {
    pub fn new(provider: Arc<dyn ExchangeRateProvider>) -> Self {
        Self {
            inner: ProviderPolicy::new(provider),
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.inner = self.inner.with_clock(clock);
        self
    }
}

#[async_trait]
impl CachePolicy for InvertPolicy {
    async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
        match self.inner.create(pair).await {
            Err(FxError::RateNotAvailable(_)) => {
                debug!(pair = %pair, "Direct rate unavailable, trying inverse");
                match self.inner.create(&pair.inverse()).await {
                    Ok(inverse) => Ok(inverse.invert()?),
                    Err(FxError::RateNotAvailable(_)) => Err(FxError::RateNotAvailable(pair.clone())),
                    Err(e) => Err(e),
                }
            }
            other => other,
        }
    }

    fn needs_refresh(&self, quote: &ConversionRateQuote, now: Timestamp) -> bool {
        self.max_age
            .is_some_and(|max_age| quote.is_older_than(max_age, now))
    }
}
