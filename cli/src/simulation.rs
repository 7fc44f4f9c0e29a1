//! Seeded random lookup workload against the quote cache.

use std::sync::Arc;
use std::time::Instant;

use moneta_common::CurrencyPair;
use moneta_fx::{CachePolicy, CacheStats, RateQuoteCache};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::metrics::{LatencySamples, LatencySummary};

/// Share of lookups that go to the hot quarter of the pairs.
const HOT_SHARE: f64 = 0.8;

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub lookups: u64,
    pub failures: u64,
    pub pairs: usize,
    pub cache: CacheStats,
    pub hit_ratio: f64,
    /// Latency of successful lookups.
    pub latency: LatencySummary,
}

/// Drives lookups against a cache.
pub struct CacheSimulation<P> {
    cache: Arc<RateQuoteCache<P>>,
    pairs: Vec<CurrencyPair>,
    rng: StdRng,
    latencies: LatencySamples,
    failures: u64,
}

impl<P: CachePolicy> CacheSimulation<P> {
    /// Create a simulation over `pair_count` pairs drawn from `pairs`.
    pub fn new(
        cache: Arc<RateQuoteCache<P>>,
        mut pairs: Vec<CurrencyPair>,
        pair_count: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        pairs.shuffle(&mut rng);
        pairs.truncate(pair_count.max(1));

        Self {
            cache,
            pairs,
            rng,
            latencies: LatencySamples::default(),
            failures: 0,
        }
    }

    pub fn pairs(&self) -> &[CurrencyPair] {
        &self.pairs
    }

    fn next_pair(&mut self) -> Option<CurrencyPair> {
        if self.pairs.is_empty() {
            return None;
        }
        let hot = (self.pairs.len() / 4).max(1);
        let idx = if self.rng.gen_bool(HOT_SHARE) {
            self.rng.gen_range(0..hot)
        } else {
            self.rng.gen_range(0..self.pairs.len())
        };
        Some(self.pairs[idx].clone())
    }

    /// Run `lookups` lookups and report.
    pub async fn run(&mut self, lookups: usize) -> SimulationReport {
        info!(lookups, pairs = self.pairs.len(), "Running cache simulation");
        self.latencies = LatencySamples::with_capacity(lookups);
        self.failures = 0;

        for _ in 0..lookups {
            let Some(pair) = self.next_pair() else {
                break;
            };

            let start = Instant::now();
            match self.cache.get(&pair).await {
                Ok(_) => self.latencies.record(start.elapsed()),
                Err(e) => {
                    debug!(pair = %pair, error = %e, "Lookup failed");
                    self.failures += 1;
                }
            }
        }

        self.report()
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            lookups: self.latencies.len() as u64 + self.failures,
            failures: self.failures,
            pairs: self.pairs.len(),
            hit_ratio: self.cache.hit_ratio(),
            cache: self.cache.stats(),
            latency: self.latencies.summary(),
        }
    }
}

/// Every ordered pair of distinct currencies.
pub fn all_pairs(currencies: &[moneta_common::Currency]) -> Vec<CurrencyPair> {
    currencies
        .iter()
        .flat_map(|from| {
            currencies
                .iter()
                .filter(move |to| *to != from)
                .map(move |to| CurrencyPair::new(from.clone(), to.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneta_common::Currency;
    use moneta_fx::{FixedRateTable, FxConfig};

    fn setup(capacity: usize) -> (Arc<RateQuoteCache<moneta_fx::InvertPolicy>>, Vec<CurrencyPair>) {
        let table = Arc::new(FixedRateTable::with_defaults());
        let pairs = all_pairs(&table.currencies());
        let config = FxConfig {
            cache_capacity: capacity,
            max_quote_age: None,
            ..Default::default()
        };
        (Arc::new(config.build_cache(table).unwrap()), pairs)
    }

    #[test]
    fn test_all_pairs() {
        let pairs = all_pairs(&[Currency::usd(), Currency::eur(), Currency::gbp()]);

        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|p| !p.is_identity()));
    }

    #[tokio::test]
    async fn test_simulation_counts_every_lookup() {
        let (cache, pairs) = setup(8);
        let mut simulation = CacheSimulation::new(cache, pairs, 12, Some(7));

        let report = simulation.run(500).await;

        assert_eq!(report.lookups, 500);
        assert_eq!(report.failures, 0);
        assert_eq!(report.pairs, 12);
        assert_eq!(report.cache.lookups, 500);
        assert_eq!(
            report.cache.hits + report.cache.inverse_hits + report.cache.misses,
            500
        );
        assert!(report.cache.entries <= 8);
        assert!(report.latency.p50_us <= report.latency.p99_us);
        assert!(report.latency.p99_us <= report.latency.max_us);
    }

    #[tokio::test]
    async fn test_cache_large_enough_for_all_pairs() {
        let (cache, pairs) = setup(16);
        let mut simulation = CacheSimulation::new(cache, pairs, 10, Some(1));

        let report = simulation.run(1_000).await;

        assert!(report.cache.misses <= 10);
        assert_eq!(report.cache.evictions, 0);
    }

    #[tokio::test]
    async fn test_same_seed_same_pairs() {
        let (cache_a, pairs_a) = setup(4);
        let (cache_b, pairs_b) = setup(4);

        let a = CacheSimulation::new(cache_a, pairs_a, 5, Some(42));
        let b = CacheSimulation::new(cache_b, pairs_b, 5, Some(42));

        assert_eq!(a.pairs(), b.pairs());
    }
}
