//! Fixed-capacity, array-backed LRU store of rate quotes.
//!
//! Entries live in a single `Vec` ordered from most recently used (index 0)
//! to least recently used. A hit shifts the entry to the front; inserting
//! into a full store drops the tail. Lookups are linear, which is the
//! right trade for the small capacities quote caches use.

use moneta_common::{ConversionRateQuote, CurrencyPair};
use std::num::NonZeroUsize;

/// LRU store keyed by currency pair.
#[derive(Debug, Clone)]
pub struct QuoteLru {
    entries: Vec<ConversionRateQuote>,
    capacity: NonZeroUsize,
}

impl QuoteLru {
    /// Create an empty store.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.get()),
            capacity,
        }
    }

    fn position(&self, pair: &CurrencyPair) -> Option<usize> {
        self.entries.iter().position(|q| q.pair() == pair)
    }

    /// Shift the entry at `idx` to the front, moving the ones before it back.
    fn promote(&mut self, idx: usize) {
        if idx > 0 {
            self.entries[..=idx].rotate_right(1);
        }
    }

    /// Look up a quote and mark it most recently used.
    pub fn get(&mut self, pair: &CurrencyPair) -> Option<&ConversionRateQuote> {
        let idx = self.position(pair)?;
        self.promote(idx);
        self.entries.first()
    }

    /// Look up a quote without touching the recency order.
    pub fn peek(&self, pair: &CurrencyPair) -> Option<&ConversionRateQuote> {
        self.position(pair).map(|idx| &self.entries[idx])
    }

    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.position(pair).is_some()
    }

    /// Insert a quote as most recently used.
    ///
    /// An existing quote for the same pair is replaced. Otherwise, when the
    /// store is full, the least recently used quote is evicted and returned.
    pub fn put(&mut self, quote: ConversionRateQuote) -> Option<ConversionRateQuote> {
        if let Some(idx) = self.position(quote.pair()) {
            self.entries[idx] = quote;
            self.promote(idx);
            return None;
        }

        let evicted = if self.entries.len() == self.capacity.get() {
            self.entries.pop()
        } else {
            None
        };
        self.entries.insert(0, quote);
        evicted
    }

    /// Remove the quote for a pair.
    pub fn remove(&mut self, pair: &CurrencyPair) -> Option<ConversionRateQuote> {
        let idx = self.position(pair)?;
        Some(self.entries.remove(idx))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Quotes from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &ConversionRateQuote> {
        self.entries.iter()
    }
}
