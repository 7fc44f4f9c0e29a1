//! Ordered currency pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::currency::Currency;
use crate::error::MonetaryError;

/// An ordered (from, to) pair of currencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub from: Currency,
    /// Currency being converted to.
    pub to: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// True when both sides are the same currency.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

impl FromStr for CurrencyPair {
    type Err = MonetaryError;

    /// Accepts `USD/EUR` or `USDEUR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (from, to) = match s.split_once('/') {
            Some(sides) => sides,
            None if s.len() == 6 && s.is_ascii() => s.split_at(3),
            None => return Err(MonetaryError::InvalidPair(s.to_string())),
        };

        if from.len() != 3 || to.len() != 3 {
            return Err(MonetaryError::InvalidPair(s.to_string()));
        }

        Ok(Self::new(Currency::from_code(from)?, Currency::from_code(to)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::eur());
        let inverse = pair.inverse();

        assert_eq!(inverse.from, Currency::eur());
        assert_eq!(inverse.to, Currency::usd());
        assert_eq!(inverse.inverse(), pair);
    }

    #[test]
    fn test_identity() {
        assert!(CurrencyPair::new(Currency::usd(), Currency::usd()).is_identity());
        assert!(!CurrencyPair::new(Currency::usd(), Currency::eur()).is_identity());
    }

    #[test]
    fn test_parse_pair() {
        let slash: CurrencyPair = "usd/jpy".parse().unwrap();
        let compact: CurrencyPair = "USDJPY".parse().unwrap();

        assert_eq!(slash, compact);
        assert_eq!(slash.to_string(), "USD/JPY");
    }

    #[test]
    fn test_parse_pair_errors() {
        assert!(matches!(
            "USD-EUR".parse::<CurrencyPair>(),
            Err(MonetaryError::InvalidPair(_))
        ));
        assert!(matches!(
            "USDE/UR".parse::<CurrencyPair>(),
            Err(MonetaryError::InvalidPair(_))
        ));
        assert!(matches!(
            "USD/ABC".parse::<CurrencyPair>(),
            Err(MonetaryError::UnknownCurrency(_))
        ));
    }
}
