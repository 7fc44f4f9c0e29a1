//! Lookup latency samples for the cache simulation.

use serde::Serialize;
use std::time::Duration;

/// Latency distribution of a run, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub average_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Per-lookup latencies collected during a run.
#[derive(Debug, Clone, Default)]
pub struct LatencySamples {
    samples_us: Vec<u64>,
}

impl LatencySamples {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples_us: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.samples_us
            .push(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    pub fn len(&self) -> usize {
        self.samples_us.len()
    }

    /// Average and nearest-rank percentiles.
    pub fn summary(&self) -> LatencySummary {
        if self.samples_us.is_empty() {
            return LatencySummary::default();
        }

        let mut sorted = self.samples_us.clone();
        sorted.sort_unstable();

        let total: u128 = sorted.iter().map(|&us| u128::from(us)).sum();
        let average = total / sorted.len() as u128;
        let rank = |percentile: usize| sorted[(sorted.len() * percentile).div_ceil(100) - 1];

        LatencySummary {
            average_us: u64::try_from(average).unwrap_or(u64::MAX),
            p50_us: rank(50),
            p99_us: rank(99),
            max_us: sorted[sorted.len() - 1],
        }
    }
}
