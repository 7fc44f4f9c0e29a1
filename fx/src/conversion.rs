//! Currency conversion through a rate quote cache.

use chrono::{DateTime, Utc};
use moneta_common::{ConversionRateQuote, Currency, CurrencyPair, MoneyAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cache::{CachePolicy, RateQuoteCache};
use crate::error::FxResult;

/// Represents a completed currency conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Input amount.
    pub input: MoneyAmount,
    /// Output amount.
    pub output: MoneyAmount,
    /// Quote used for the conversion.
    pub quote: ConversionRateQuote,
    /// When the conversion was executed.
    pub executed_at: DateTime<Utc>,
}

impl Conversion {
    /// Create a new conversion record.
    pub fn new(input: MoneyAmount, output: MoneyAmount, quote: ConversionRateQuote) -> Self {
        Self {
            id: Uuid::now_v7(),
            input,
            output,
            quote,
            executed_at: Utc::now(),
        }
    }

    /// Rate actually realised after rounding to minor units.
    pub fn effective_rate(&self) -> Decimal {
        let input = self.input.to_decimal();
        if input.is_zero() {
            return Decimal::ZERO;
        }
        self.output.to_decimal() / input
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.input.currency().clone(), self.output.currency().clone())
    }
}

/// Converts amounts using quotes from a shared cache.
pub struct CurrencyConverter<P> {
    cache: Arc<RateQuoteCache<P>>,
}

impl<P: CachePolicy> CurrencyConverter<P> {
    pub fn new(cache: Arc<RateQuoteCache<P>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &RateQuoteCache<P> {
        &self.cache
    }

    /// Current quote for converting `from` into `to`.
    pub async fn quote(&self, from: Currency, to: Currency) -> FxResult<ConversionRateQuote> {
        self.cache.get(&CurrencyPair::new(from, to)).await
    }

    /// Convert an amount to another currency.
    #[instrument(skip(self, amount), fields(amount = %amount, to = %to))]
    pub async fn convert(&self, amount: &MoneyAmount, to: Currency) -> FxResult<Conversion> {
        let pair = CurrencyPair::new(amount.currency().clone(), to);
        let quote = self.cache.get(&pair).await?;
        let output = quote.convert(amount)?;

        let conversion = Conversion::new(amount.clone(), output, quote);

        info!(
            conversion_id = %conversion.id,
            output = %conversion.output,
            effective_rate = %conversion.effective_rate(),
            "Conversion completed"
        );

        Ok(conversion)
    }

    /// Convert and return only the resulting amount.
    pub async fn convert_amount(&self, amount: &MoneyAmount, to: Currency) -> FxResult<MoneyAmount> {
        Ok(self.convert(amount, to).await?.output)
    }
}

impl<P> Clone for CurrencyConverter<P> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}
