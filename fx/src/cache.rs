//! Rate quote cache with pluggable miss and staleness policy.

use async_trait::async_trait;
use moneta_common::{Clock, ConversionRateQuote, CurrencyPair, SystemClock, Timestamp};
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{FxError, FxResult};
use crate::lru::QuoteLru;

/// Hooks that decide how a [`RateQuoteCache`] fills and ages its entries.
#[async_trait]
pub trait CachePolicy: Send + Sync {
    /// Produce a quote for a pair that is missing or stale.
    async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote>;

    /// Whether a cached quote must be replaced before it is served.
    fn needs_refresh(&self, _quote: &ConversionRateQuote, _now: Timestamp) -> bool {
        false
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Maximum number of quotes held.
    pub capacity: NonZeroUsize,
    /// Serve a miss by inverting a cached quote for the inverse pair.
    pub derive_from_inverse: bool,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN),
            derive_from_inverse: true,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups for non-identity pairs.
    pub lookups: u64,
    /// Fresh entries served directly.
    pub hits: u64,
    /// Misses served by inverting the inverse pair's quote.
    pub inverse_hits: u64,
    /// Lookups that had no usable entry.
    pub misses: u64,
    /// Stale entries successfully replaced.
    pub refreshes: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Share of lookups answered without calling the policy.
    pub fn hit_ratio(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        (self.hits + self.inverse_hits) as f64 / self.lookups as f64
    }
}

struct CacheState {
    lru: QuoteLru,
    stats: CacheStats,
}

enum Lookup {
    Hit(ConversionRateQuote),
    Stale,
    Miss,
}

/// Whether a stored quote was new or replaced a stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Fill,
    Refresh,
}

/// LRU cache of conversion-rate quotes.
///
/// The store is guarded by a mutex that is released before the policy's
/// `create` hook runs, so slow providers never block other lookups.
pub struct RateQuoteCache<P> {
    state: Mutex<CacheState>,
    policy: P,
    clock: Arc<dyn Clock>,
    derive_from_inverse: bool,
}

impl<P: CachePolicy> RateQuoteCache<P> {
    /// Create a cache with the given policy, using the system clock.
    pub fn new(policy: P, config: RateCacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                lru: QuoteLru::new(config.capacity),
                stats: CacheStats::default(),
            }),
            policy,
            clock: Arc::new(SystemClock),
            derive_from_inverse: config.derive_from_inverse,
        }
    }

    /// Use a different clock for staleness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Get a quote, consulting the policy on a miss or stale entry.
    #[instrument(skip(self), fields(pair = %pair))]
    pub async fn get(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
        let now = self.clock.now();

        if pair.is_identity() {
            return Ok(ConversionRateQuote::identity(pair.from.clone(), now));
        }

        match self.lookup(pair, now) {
            Lookup::Hit(quote) => Ok(quote),
            Lookup::Stale => {
                debug!("Cache entry stale, refreshing");
                let quote = self.create(pair).await?;
                self.store(quote.clone(), StoreKind::Refresh);
                Ok(quote)
            }
            Lookup::Miss => {
                debug!("Cache miss");
                let quote = self.create(pair).await?;
                self.store(quote.clone(), StoreKind::Fill);
                Ok(quote)
            }
        }
    }

    fn lookup(&self, pair: &CurrencyPair, now: Timestamp) -> Lookup {
        let mut state = self.state.lock();
        state.stats.lookups += 1;

        let stale = state
            .lru
            .peek(pair)
            .map(|quote| self.policy.needs_refresh(quote, now));

        match stale {
            Some(false) => {
                if let Some(quote) = state.lru.get(pair).cloned() {
                    state.stats.hits += 1;
                    debug!("Cache hit");
                    return Lookup::Hit(quote);
                }
                state.stats.misses += 1;
                Lookup::Miss
            }
            Some(true) => Lookup::Stale,
            None => {
                if self.derive_from_inverse {
                    if let Some(quote) = self.derive_inverse(&mut state, pair, now) {
                        state.stats.inverse_hits += 1;
                        debug!("Cache hit on inverse pair");
                        return Lookup::Hit(quote);
                    }
                }
                state.stats.misses += 1;
                Lookup::Miss
            }
        }
    }

    fn derive_inverse(
        &self,
        state: &mut CacheState,
        pair: &CurrencyPair,
        now: Timestamp,
    ) -> Option<ConversionRateQuote> {
        let inverse_pair = pair.inverse();
        let inverse = state.lru.peek(&inverse_pair)?;
        if self.policy.needs_refresh(inverse, now) {
            return None;
        }

        let derived = inverse.invert().ok()?;
        if state.lru.put(derived.clone()).is_some() {
            state.stats.evictions += 1;
        }
        Some(derived)
    }

    async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
        let quote = self.policy.create(pair).await?;
        if quote.pair() != pair {
            return Err(FxError::InvalidQuote {
                expected: pair.clone(),
                actual: quote.pair().clone(),
            });
        }
        Ok(quote)
    }

    fn store(&self, quote: ConversionRateQuote, kind: StoreKind) {
        let mut state = self.state.lock();
        if kind == StoreKind::Refresh {
            state.stats.refreshes += 1;
        }
        if let Some(evicted) = state.lru.put(quote) {
            state.stats.evictions += 1;
            debug!(evicted = %evicted.pair(), "Evicted least recently used quote");
        }
    }

    /// Seed the cache with a quote.
    pub fn put(&self, quote: ConversionRateQuote) {
        self.store(quote, StoreKind::Fill);
    }

    /// Drop the quote for a pair. Returns whether one was cached.
    pub fn invalidate(&self, pair: &CurrencyPair) -> bool {
        self.state.lock().lru.remove(pair).is_some()
    }

    /// Clear all cached quotes.
    pub fn clear(&self) {
        self.state.lock().lru.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().lru.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().lru.capacity()
    }

    /// Cached quotes from most to least recently used.
    pub fn snapshot(&self) -> Vec<ConversionRateQuote> {
        self.state.lock().lru.iter().cloned().collect()
    }

    /// Share of lookups answered without calling the policy.
    pub fn hit_ratio(&self) -> f64 {
        self.state.lock().stats.hit_ratio()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.lru.len(),
            capacity: state.lru.capacity(),
            ..state.stats.clone()
        }
    }
}

/// Shared rate cache.
pub type SharedRateQuoteCache<P> = Arc<RateQuoteCache<P>>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use moneta_common::{now, Currency, ManualClock};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Policy that hands out increasing rates and counts calls.
    #[derive(Default)]
    struct CountingPolicy {
        created: AtomicUsize,
        max_age: Option<Duration>,
        clock: Option<Arc<ManualClock>>,
    }

    #[async_trait]
    impl CachePolicy for CountingPolicy {
        async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
            if pair.to == Currency::new("XYZ") {
                return Err(FxError::RateNotAvailable(pair.clone()));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            let at = self.clock.as_ref().map(|c| c.now()).unwrap_or_else(now);
            Ok(ConversionRateQuote::new(pair.clone(), Decimal::from(n), at)?)
        }

        fn needs_refresh(&self, quote: &ConversionRateQuote, now: Timestamp) -> bool {
            self.max_age.is_some_and(|max| quote.is_older_than(max, now))
        }
    }

    struct WrongPairPolicy;

    #[async_trait]
    impl CachePolicy for WrongPairPolicy {
        async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
            Ok(ConversionRateQuote::new(pair.inverse(), dec!(2), now())?)
        }
    }

    /// Policy whose `create` parks until released.
    #[derive(Default)]
    struct GatedPolicy {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CachePolicy for GatedPolicy {
        async fn create(&self, pair: &CurrencyPair) -> FxResult<ConversionRateQuote> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(ConversionRateQuote::new(pair.clone(), dec!(2), now())?)
        }
    }

    fn pair(from: &str, to: &str) -> CurrencyPair {
        CurrencyPair::new(Currency::new(from), Currency::new(to))
    }

    fn config(capacity: usize) -> RateCacheConfig {
        RateCacheConfig {
            capacity: NonZeroUsize::new(capacity).unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = RateQuoteCache::new(CountingPolicy::default(), config(4));

        let first = cache.get(&pair("USD", "EUR")).await.unwrap();
        let second = cache.get(&pair("USD", "EUR")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.policy().created.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_ratio(), 0.5);
        assert_eq!(cache.hit_ratio(), 0.5);
    }

    #[tokio::test]
    async fn test_identity_pair_bypasses_cache() {
        let cache = RateQuoteCache::new(CountingPolicy::default(), config(4));

        let quote = cache.get(&pair("GBP", "GBP")).await.unwrap();

        assert_eq!(quote.rate(), Decimal::ONE);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().lookups, 0);
        assert_eq!(cache.policy().created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = RateQuoteCache::new(CountingPolicy::default(), config(2));

        cache.get(&pair("USD", "EUR")).await.unwrap();
        cache.get(&pair("USD", "GBP")).await.unwrap();
        cache.get(&pair("USD", "EUR")).await.unwrap();
        cache.get(&pair("USD", "JPY")).await.unwrap();

        let cached: Vec<CurrencyPair> = cache.snapshot().iter().map(|q| q.pair().clone()).collect();
        assert_eq!(cached, vec![pair("USD", "JPY"), pair("USD", "EUR")]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refreshed() {
        let clock = Arc::new(ManualClock::default());
        let policy = CountingPolicy {
            max_age: Some(Duration::seconds(30)),
            clock: Some(clock.clone()),
            ..Default::default()
        };
        let cache = RateQuoteCache::new(policy, config(4)).with_clock(clock.clone());

        let first = cache.get(&pair("USD", "EUR")).await.unwrap();
        clock.advance(Duration::seconds(30));
        assert_eq!(cache.get(&pair("USD", "EUR")).await.unwrap(), first);

        clock.advance(Duration::seconds(1));
        let refreshed = cache.get(&pair("USD", "EUR")).await.unwrap();

        assert_eq!(refreshed.rate(), dec!(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().refreshes, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_entry() {
        let clock = Arc::new(ManualClock::default());
        let policy = CountingPolicy {
            max_age: Some(Duration::seconds(1)),
            clock: Some(clock.clone()),
            ..Default::default()
        };
        let cache = RateQuoteCache::new(policy, config(4)).with_clock(clock.clone());
        let xyz = pair("USD", "XYZ");

        let seeded = ConversionRateQuote::new(xyz.clone(), dec!(3), clock.now()).unwrap();
        cache.put(seeded.clone());
        clock.advance(Duration::seconds(5));

        assert!(matches!(
            cache.get(&xyz).await,
            Err(FxError::RateNotAvailable(_))
        ));
        assert_eq!(cache.snapshot(), vec![seeded]);
        assert_eq!(cache.stats().refreshes, 0);
    }

    #[tokio::test]
    async fn test_miss_error_is_not_cached() {
        let cache = RateQuoteCache::new(CountingPolicy::default(), config(4));

        assert!(cache.get(&pair("USD", "XYZ")).await.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_derive_from_inverse() {
        let cache = RateQuoteCache::new(CountingPolicy::default(), config(4));
        cache.put(ConversionRateQuote::new(pair("USD", "EUR"), dec!(0.8), now()).unwrap());

        let derived = cache.get(&pair("EUR", "USD")).await.unwrap();

        assert_eq!(derived.rate(), dec!(1.25));
        assert_eq!(cache.policy().created.load(Ordering::SeqCst), 0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().inverse_hits, 1);
    }

    #[tokio::test]
    async fn test_inverse_not_used_when_disabled() {
        let config = RateCacheConfig {
            derive_from_inverse: false,
            ..config(4)
        };
        let cache = RateQuoteCache::new(CountingPolicy::default(), config);
        cache.put(ConversionRateQuote::new(pair("USD", "EUR"), dec!(0.8), now()).unwrap());

        let quote = cache.get(&pair("EUR", "USD")).await.unwrap();

        assert_eq!(quote.rate(), dec!(1));
        assert_eq!(cache.stats().inverse_hits, 0);
    }

    #[tokio::test]
    async fn test_stale_inverse_goes_to_policy() {
        let clock = Arc::new(ManualClock::default());
        let policy = CountingPolicy {
            max_age: Some(Duration::seconds(30)),
            clock: Some(clock.clone()),
            ..Default::default()
        };
        let cache = RateQuoteCache::new(policy, config(4)).with_clock(clock.clone());
        cache.put(ConversionRateQuote::new(pair("USD", "EUR"), dec!(0.8), clock.now()).unwrap());
        clock.advance(Duration::seconds(31));

        let quote = cache.get(&pair("EUR", "USD")).await.unwrap();

        assert_eq!(quote.rate(), dec!(1));
        assert_eq!(cache.policy().created.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inverse_hits, 0);
    }

    #[tokio::test]
    async fn test_derived_inverse_evicts_when_full() {
        let cache = RateQuoteCache::new(CountingPolicy::default(), config(1));
        cache.put(ConversionRateQuote::new(pair("USD", "EUR"), dec!(0.8), now()).unwrap());

        let derived = cache.get(&pair("EUR", "USD")).await.unwrap();

        assert_eq!(derived.rate(), dec!(1.25));
        assert_eq!(cache.snapshot(), vec![derived]);
        let stats = cache.stats();
        assert_eq!(stats.inverse_hits, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_store_usable_while_create_runs() {
        let cache = Arc::new(RateQuoteCache::new(GatedPolicy::default(), config(4)));

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get(&pair("USD", "EUR")).await }
        });
        cache.policy().entered.notified().await;

        cache.put(ConversionRateQuote::new(pair("USD", "GBP"), dec!(0.79), now()).unwrap());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().misses, 1);

        cache.policy().release.notify_one();
        let quote = pending.await.unwrap().unwrap();

        assert_eq!(quote.rate(), dec!(2));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_quote_for_wrong_pair() {
        let cache = RateQuoteCache::new(WrongPairPolicy, config(4));

        assert!(matches!(
            cache.get(&pair("USD", "EUR")).await,
            Err(FxError::InvalidQuote { .. })
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = RateQuoteCache::new(CountingPolicy::default(), config(4));
        cache.get(&pair("USD", "EUR")).await.unwrap();
        cache.get(&pair("USD", "GBP")).await.unwrap();

        assert!(cache.invalidate(&pair("USD", "EUR")));
        assert!(!cache.invalidate(&pair("USD", "EUR")));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
    }
}
