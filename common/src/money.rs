//! Fixed-point monetary amounts.
//!
//! A [`MoneyAmount`] stores a signed 64-bit count of the currency's minor
//! units (cents for USD, yen for JPY, fils for KWD). Every arithmetic
//! operation is checked: a result that does not fit returns
//! [`MonetaryError::Overflow`] instead of wrapping or panicking.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use crate::currency::Currency;
use crate::error::{MonetaryError, MonetaryResult};

/// A monetary amount in minor units of a currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoneyAmount {
    units: i64,
    currency: Currency,
}

/// 10^places as an i64 scale factor.
fn scale_factor(places: u32) -> MonetaryResult<i64> {
    10i64
        .checked_pow(places)
        .ok_or(MonetaryError::Overflow("scale"))
}

impl MoneyAmount {
    /// Create from a count of minor units.
    pub fn from_minor_units(units: i64, currency: Currency) -> Self {
        Self { units, currency }
    }

    /// Create from a whole number of major units.
    pub fn from_major(major: i64, currency: Currency) -> MonetaryResult<Self> {
        let scale = scale_factor(currency.decimal_places())?;
        let units = major
            .checked_mul(scale)
            .ok_or(MonetaryError::Overflow("from_major"))?;
        Ok(Self { units, currency })
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { units: 0, currency }
    }

    /// Parse an exact decimal string such as `-12.05`.
    ///
    /// At most `currency.decimal_places()` fractional digits are accepted;
    /// nothing is rounded.
    pub fn parse(text: &str, currency: Currency) -> MonetaryResult<Self> {
        let invalid = || MonetaryError::InvalidAmount(text.to_string());
        let trimmed = text.trim();

        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
            return Err(invalid());
        }

        let places = currency.decimal_places();
        if fraction.len() > places as usize {
            return Err(MonetaryError::ExcessPrecision {
                currency,
                max_places: places,
            });
        }

        let padding = places as usize - fraction.len();
        let mut units: i128 = 0;
        for b in whole
            .bytes()
            .chain(fraction.bytes())
            .chain(std::iter::repeat(b'0').take(padding))
        {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(i128::from(b - b'0')))
                .ok_or(MonetaryError::Overflow("parse"))?;
        }
        if negative {
            units = -units;
        }

        let units = i64::try_from(units).map_err(|_| MonetaryError::Overflow("parse"))?;
        Ok(Self { units, currency })
    }

    /// Create from a decimal, rounding half away from zero to minor units.
    pub fn from_decimal(value: Decimal, currency: Currency) -> MonetaryResult<Self> {
        let scale = scale_factor(currency.decimal_places())?;
        let units = value
            .checked_mul(Decimal::from(scale))
            .ok_or(MonetaryError::Overflow("from_decimal"))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(MonetaryError::Overflow("from_decimal"))?;
        Ok(Self { units, currency })
    }

    /// Count of minor units.
    pub fn minor_units(&self) -> i64 {
        self.units
    }

    /// Currency of this amount.
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// Check if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.units > 0
    }

    /// Check if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.units < 0
    }

    /// Exact decimal value in major units.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.units, self.currency.decimal_places())
    }

    fn ensure_same_currency(&self, other: &MoneyAmount) -> MonetaryResult<()> {
        if self.currency != other.currency {
            return Err(MonetaryError::CurrencyMismatch {
                expected: self.currency.clone(),
                actual: other.currency.clone(),
            });
        }
        Ok(())
    }

    fn with_units(&self, units: i64) -> Self {
        Self {
            units,
            currency: self.currency.clone(),
        }
    }

    /// Add an amount in the same currency.
    pub fn checked_add(&self, other: &MoneyAmount) -> MonetaryResult<Self> {
        self.ensure_same_currency(other)?;
        let units = self
            .units
            .checked_add(other.units)
            .ok_or(MonetaryError::Overflow("add"))?;
        Ok(self.with_units(units))
    }

    /// Subtract an amount in the same currency.
    pub fn checked_sub(&self, other: &MoneyAmount) -> MonetaryResult<Self> {
        self.ensure_same_currency(other)?;
        let units = self
            .units
            .checked_sub(other.units)
            .ok_or(MonetaryError::Overflow("sub"))?;
        Ok(self.with_units(units))
    }

    /// Multiply by an integer factor.
    pub fn checked_mul(&self, factor: i64) -> MonetaryResult<Self> {
        let units = self
            .units
            .checked_mul(factor)
            .ok_or(MonetaryError::Overflow("mul"))?;
        Ok(self.with_units(units))
    }

    /// Negate the amount.
    pub fn checked_neg(&self) -> MonetaryResult<Self> {
        let units = self.units.checked_neg().ok_or(MonetaryError::Overflow("neg"))?;
        Ok(self.with_units(units))
    }

    /// Get the absolute value.
    pub fn checked_abs(&self) -> MonetaryResult<Self> {
        let units = self.units.checked_abs().ok_or(MonetaryError::Overflow("abs"))?;
        Ok(self.with_units(units))
    }

    /// Split the amount in proportion to `ratios` without losing minor units.
    ///
    /// Leftover units go one at a time to the earliest parts with a
    /// non-zero ratio, so the parts always sum to the original amount.
    pub fn allocate(&self, ratios: &[u32]) -> MonetaryResult<Vec<Self>> {
        if ratios.is_empty() {
            return Err(MonetaryError::InvalidAllocation("no ratios given".to_string()));
        }
        let total: i128 = ratios.iter().map(|&r| i128::from(r)).sum();
        if total == 0 {
            return Err(MonetaryError::InvalidAllocation("ratios sum to zero".to_string()));
        }

        let units = i128::from(self.units);
        let mut parts: Vec<i128> = ratios
            .iter()
            .map(|&r| units * i128::from(r) / total)
            .collect();

        let remainder = units - parts.iter().sum::<i128>();
        let step = remainder.signum();
        parts
            .iter_mut()
            .zip(ratios)
            .filter(|(_, ratio)| **ratio > 0)
            .take(remainder.unsigned_abs() as usize)
            .for_each(|(part, _)| *part += step);

        parts
            .into_iter()
            .map(|part| {
                i64::try_from(part)
                    .map(|units| self.with_units(units))
                    .map_err(|_| MonetaryError::Overflow("allocate"))
            })
            .collect()
    }

    /// Split into `n` parts that differ by at most one minor unit.
    pub fn split(&self, n: usize) -> MonetaryResult<Vec<Self>> {
        if n == 0 {
            return Err(MonetaryError::InvalidAllocation("cannot split into zero parts".to_string()));
        }
        self.allocate(&vec![1; n])
    }
}

impl PartialOrd for MoneyAmount {
    /// Amounts in different currencies are not comparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.units.cmp(&other.units))
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let places = self.currency.decimal_places();
        let sign = if self.units < 0 { "-" } else { "" };
        let abs = self.units.unsigned_abs();

        if places == 0 {
            return write!(f, "{}{} {}", sign, abs, self.currency);
        }

        let scale = 10u64.pow(places);
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.currency,
            width = places as usize
        )
    }
}

impl Add for MoneyAmount {
    type Output = MonetaryResult<MoneyAmount>;

    fn add(self, other: MoneyAmount) -> Self::Output {
        self.checked_add(&other)
    }
}

impl Sub for MoneyAmount {
    type Output = MonetaryResult<MoneyAmount>;

    fn sub(self, other: MoneyAmount) -> Self::Output {
        self.checked_sub(&other)
    }
}
