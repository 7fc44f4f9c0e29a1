//! ISO 4217 currencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MonetaryError, MonetaryResult};

/// Static ISO 4217 data for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    /// Alphabetic code.
    pub code: &'static str,
    /// Numeric code.
    pub numeric: u16,
    /// Minor unit exponent (number of decimal places).
    pub minor_units: u32,
    /// English name.
    pub name: &'static str,
}

const fn info(code: &'static str, numeric: u16, minor_units: u32, name: &'static str) -> CurrencyInfo {
    CurrencyInfo {
        code,
        numeric,
        minor_units,
        name,
    }
}

/// Known ISO 4217 currencies, sorted by code.
pub static ISO_CURRENCIES: &[CurrencyInfo] = &[
    info("AED", 784, 2, "UAE Dirham"),
    info("ARS", 32, 2, "Argentine Peso"),
    info("AUD", 36, 2, "Australian Dollar"),
    info("BHD", 48, 3, "Bahraini Dinar"),
    info("BRL", 986, 2, "Brazilian Real"),
    info("CAD", 124, 2, "Canadian Dollar"),
    info("CHF", 756, 2, "Swiss Franc"),
    info("CLF", 990, 4, "Unidad de Fomento"),
    info("CLP", 152, 0, "Chilean Peso"),
    info("CNY", 156, 2, "Yuan Renminbi"),
    info("CZK", 203, 2, "Czech Koruna"),
    info("DKK", 208, 2, "Danish Krone"),
    info("EUR", 978, 2, "Euro"),
    info("GBP", 826, 2, "Pound Sterling"),
    info("HKD", 344, 2, "Hong Kong Dollar"),
    info("HUF", 348, 2, "Forint"),
    info("IDR", 360, 2, "Rupiah"),
    info("ILS", 376, 2, "New Israeli Sheqel"),
    info("INR", 356, 2, "Indian Rupee"),
    info("ISK", 352, 0, "Iceland Krona"),
    info("JOD", 400, 3, "Jordanian Dinar"),
    info("JPY", 392, 0, "Yen"),
    info("KRW", 410, 0, "Won"),
    info("KWD", 414, 3, "Kuwaiti Dinar"),
    info("MXN", 484, 2, "Mexican Peso"),
    info("NOK", 578, 2, "Norwegian Krone"),
    info("NZD", 554, 2, "New Zealand Dollar"),
    info("OMR", 512, 3, "Rial Omani"),
    info("PLN", 985, 2, "Zloty"),
    info("SEK", 752, 2, "Swedish Krona"),
    info("SGD", 702, 2, "Singapore Dollar"),
    info("THB", 764, 2, "Baht"),
    info("TND", 788, 3, "Tunisian Dinar"),
    info("TRY", 949, 2, "Turkish Lira"),
    info("USD", 840, 2, "US Dollar"),
    info("VND", 704, 0, "Dong"),
    info("ZAR", 710, 2, "Rand"),
];

/// Look up ISO data for a code (case-sensitive, upper case).
pub fn lookup(code: &str) -> Option<&'static CurrencyInfo> {
    ISO_CURRENCIES
        .binary_search_by(|c| c.code.cmp(code))
        .ok()
        .map(|idx| &ISO_CURRENCIES[idx])
}

/// ISO 4217 currency code.
///
/// Codes are always upper case, including ones read through serde.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a currency from a code without checking the ISO table.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Create a currency from a code known to the ISO table.
    pub fn from_code(code: &str) -> MonetaryResult<Self> {
        let upper = code.trim().to_uppercase();
        match lookup(&upper) {
            Some(info) => Ok(Self(info.code.to_string())),
            None => Err(MonetaryError::UnknownCurrency(code.to_string())),
        }
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// ISO data for this currency, if known.
    pub fn info(&self) -> Option<&'static CurrencyInfo> {
        lookup(&self.0)
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        self.info().map(|i| i.minor_units).unwrap_or(2)
    }

    /// ISO numeric code.
    pub fn numeric_code(&self) -> Option<u16> {
        self.info().map(|i| i.numeric)
    }

    /// English display name.
    pub fn display_name(&self) -> Option<&'static str> {
        self.info().map(|i| i.name)
    }

    /// Iterate over every currency in the ISO table.
    pub fn all() -> impl Iterator<Item = Currency> {
        ISO_CURRENCIES.iter().map(|i| Currency(i.code.to_string()))
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }

    pub fn chf() -> Self {
        Self::new("CHF")
    }

    pub fn cad() -> Self {
        Self::new("CAD")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl FromStr for Currency {
    type Err = MonetaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}
