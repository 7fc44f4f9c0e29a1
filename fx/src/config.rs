//! FX configuration.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::cache::{RateCacheConfig, RateQuoteCache};
use crate::error::{FxError, FxResult};
use crate::policy::InvertPolicy;
use crate::provider::ExchangeRateProvider;

/// Settings for the quote cache built by [`FxConfig::build_cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxConfig {
    /// Number of quotes the cache holds.
    pub cache_capacity: usize,
    /// Refetch quotes older than this. `None` keeps them forever.
    pub max_quote_age: Option<Duration>,
    /// Answer misses by inverting a cached inverse quote.
    pub derive_from_inverse: bool,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 32,
            max_quote_age: Some(Duration::from_secs(60)),
            derive_from_inverse: true,
        }
    }
}

impl FxConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparsable values are logged and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("MONETA_CACHE_CAPACITY") {
            match value.parse() {
                Ok(capacity) => config.cache_capacity = capacity,
                Err(_) => warn!(key = "MONETA_CACHE_CAPACITY", value = %value, "Ignoring invalid value"),
            }
        }

        if let Some(value) = lookup("MONETA_MAX_AGE_SECS") {
            match value.parse::<u64>() {
                Ok(0) => config.max_quote_age = None,
                Ok(secs) => config.max_quote_age = Some(Duration::from_secs(secs)),
                Err(_) => warn!(key = "MONETA_MAX_AGE_SECS", value = %value, "Ignoring invalid value"),
            }
        }

        if let Some(value) = lookup("MONETA_DERIVE_FROM_INVERSE") {
            match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.derive_from_inverse = true,
                "0" | "false" | "no" => config.derive_from_inverse = false,
                _ => warn!(key = "MONETA_DERIVE_FROM_INVERSE", value = %value, "Ignoring invalid value"),
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.cache_capacity == 0 {
            return Err(FxError::InvalidConfig("Cache capacity cannot be 0".to_string()));
        }

        if let Some(max_age) = self.max_quote_age {
            if max_age.is_zero() {
                return Err(FxError::InvalidConfig("Max quote age cannot be 0".to_string()));
            }
            if chrono::Duration::from_std(max_age).is_err() {
                return Err(FxError::InvalidConfig("Max quote age is out of range".to_string()));
            }
        }

        Ok(())
    }

    /// Cache settings derived from this configuration.
    pub fn cache_config(&self) -> FxResult<RateCacheConfig> {
        let capacity = NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| FxError::InvalidConfig("Cache capacity cannot be 0".to_string()))?;

        Ok(RateCacheConfig {
            capacity,
            derive_from_inverse: self.derive_from_inverse,
        })
    }

    /// Build a cache over `provider` that inverts missing pairs and
    /// refreshes quotes older than `max_quote_age`.
    pub fn build_cache(
        &self,
        provider: Arc<dyn ExchangeRateProvider>,
    ) -> FxResult<RateQuoteCache<InvertPolicy>> {
        self.validate()?;

        let mut policy = InvertPolicy::new(provider);
        if let Some(max_age) = self.max_quote_age {
            let max_age = chrono::Duration::from_std(max_age)
                .map_err(|e| FxError::InvalidConfig(e.to_string()))?;
            policy = policy.with_max_age(max_age);
        }

        Ok(RateQuoteCache::new(policy, self.cache_config()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FixedRateTable;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FxConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_matches_cache_default() {
        let from_config = FxConfig::default().cache_config().unwrap();
        let cache_default = RateCacheConfig::default();

        assert!(from_config.derive_from_inverse);
        assert_eq!(from_config.derive_from_inverse, cache_default.derive_from_inverse);
        assert_eq!(from_config.capacity, cache_default.capacity);
    }

    #[test]
    fn test_from_lookup() {
        let config = FxConfig::from_lookup(lookup_from(&[
            ("MONETA_CACHE_CAPACITY", "8"),
            ("MONETA_MAX_AGE_SECS", "5"),
            ("MONETA_DERIVE_FROM_INVERSE", "false"),
        ]));

        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.max_quote_age, Some(Duration::from_secs(5)));
        assert!(!config.derive_from_inverse);
    }

    #[test]
    fn test_zero_max_age_disables_refresh() {
        let config = FxConfig::from_lookup(lookup_from(&[("MONETA_MAX_AGE_SECS", "0")]));
        assert_eq!(config.max_quote_age, None);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = FxConfig::from_lookup(lookup_from(&[
            ("MONETA_CACHE_CAPACITY", "lots"),
            ("MONETA_DERIVE_FROM_INVERSE", "maybe"),
        ]));

        assert_eq!(config, FxConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let config = FxConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FxError::InvalidConfig(_))));
        assert!(config.build_cache(Arc::new(FixedRateTable::with_defaults())).is_err());

        let config = FxConfig {
            max_quote_age: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_cache() {
        let config = FxConfig {
            cache_capacity: 3,
            ..Default::default()
        };

        let cache = config.build_cache(Arc::new(FixedRateTable::with_defaults())).unwrap();

        assert_eq!(cache.capacity(), 3);
        assert!(cache.is_empty());
    }
}
