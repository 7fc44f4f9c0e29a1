//! Moneta FX
//!
//! Exchange-rate lookup and conversion on top of the Moneta value types.
//!
//! # Features
//!
//! - Single-method rate provider trait with a hard-coded table
//! - Fixed-capacity LRU quote cache with pluggable miss and refresh policy
//! - Refresh and invert policy variants
//! - Conversion records with realised rates
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use moneta_common::{Currency, MoneyAmount};
//! use moneta_fx::{CurrencyConverter, FixedRateTable, FxConfig};
//!
//! let cache = FxConfig::default().build_cache(Arc::new(FixedRateTable::with_defaults()))?;
//! let converter = CurrencyConverter::new(Arc::new(cache));
//!
//! let usd = MoneyAmount::parse("1000.00", Currency::usd())?;
//! let eur = converter.convert_amount(&usd, Currency::eur()).await?;
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod error;
pub mod lru;
pub mod policy;
pub mod provider;

pub use cache::{CachePolicy, CacheStats, RateCacheConfig, RateQuoteCache, SharedRateQuoteCache};
pub use config::FxConfig;
pub use conversion::{Conversion, CurrencyConverter};
pub use error::{FxError, FxResult};
pub use lru::QuoteLru;
pub use policy::{InvertPolicy, ProviderPolicy, RefreshPolicy};
pub use provider::{ExchangeRateProvider, FixedRateTable};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
