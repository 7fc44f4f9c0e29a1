//! Side-by-side comparisons of money held in primitive numbers versus
//! [`MoneyAmount`].

use moneta_common::{Currency, MoneyAmount, MonetaryResult};
use serde::Serialize;

/// One pitfall and both results.
#[derive(Debug, Clone, Serialize)]
pub struct Pitfall {
    pub title: &'static str,
    /// What the primitive computation produced.
    pub primitive: String,
    /// What the fixed-point computation produced.
    pub fixed_point: String,
}

fn usd(text: &str) -> MonetaryResult<MoneyAmount> {
    MoneyAmount::parse(text, Currency::usd())
}

fn float_addition() -> MonetaryResult<Pitfall> {
    let primitive = 0.1_f64 + 0.2_f64;
    let fixed = usd("0.10")?.checked_add(&usd("0.20")?)?;

    Ok(Pitfall {
        title: "0.10 + 0.20",
        primitive: primitive.to_string(),
        fixed_point: fixed.to_string(),
    })
}

fn repeated_sum() -> MonetaryResult<Pitfall> {
    let primitive: f64 = std::iter::repeat(0.1_f64).take(10).sum();

    let dime = usd("0.10")?;
    let mut fixed = MoneyAmount::zero(Currency::usd());
    for _ in 0..10 {
        fixed = fixed.checked_add(&dime)?;
    }

    Ok(Pitfall {
        title: "Ten times 0.10",
        primitive: primitive.to_string(),
        fixed_point: fixed.to_string(),
    })
}

fn truncating_to_cents() -> MonetaryResult<Pitfall> {
    let primitive = (1.15_f64 * 100.0) as i64;
    let fixed = usd("1.15")?;

    Ok(Pitfall {
        title: "1.15 converted to cents",
        primitive: format!("{} cents", primitive),
        fixed_point: format!("{} cents", fixed.minor_units()),
    })
}

fn narrow_integer_overflow() -> MonetaryResult<Pitfall> {
    let primitive = 30_000_000_i32.wrapping_mul(100);
    let fixed = MoneyAmount::from_major(30_000_000, Currency::usd())?;

    Ok(Pitfall {
        title: "30,000,000.00 USD as i32 cents",
        primitive: format!("{} cents", primitive),
        fixed_point: format!("{} cents", fixed.minor_units()),
    })
}

fn lossy_split() -> MonetaryResult<Pitfall> {
    let share = ((100.0_f64 / 3.0) * 100.0).round() / 100.0;
    let primitive = share * 3.0;
    let parts = usd("100.00")?.split(3)?;

    Ok(Pitfall {
        title: "100.00 split three ways",
        primitive: format!("3 x {:.2} = {:.2}", share, primitive),
        fixed_point: parts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" + "),
    })
}

/// Every pitfall, in presentation order.
pub fn pitfalls() -> MonetaryResult<Vec<Pitfall>> {
    Ok(vec![
        float_addition()?,
        repeated_sum()?,
        truncating_to_cents()?,
        narrow_integer_overflow()?,
        lossy_split()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_addition() {
        let pitfall = float_addition().unwrap();
        assert_eq!(pitfall.primitive, "0.30000000000000004");
        assert_eq!(pitfall.fixed_point, "0.30 USD");
    }

    #[test]
    fn test_repeated_sum() {
        let pitfall = repeated_sum().unwrap();
        assert_eq!(pitfall.primitive, "0.9999999999999999");
        assert_eq!(pitfall.fixed_point, "1.00 USD");
    }

    #[test]
    fn test_truncating_to_cents() {
        let pitfall = truncating_to_cents().unwrap();
        assert_eq!(pitfall.primitive, "114 cents");
        assert_eq!(pitfall.fixed_point, "115 cents");
    }

    #[test]
    fn test_narrow_integer_overflow() {
        let pitfall = narrow_integer_overflow().unwrap();
        assert_eq!(pitfall.primitive, "-1294967296 cents");
        assert_eq!(pitfall.fixed_point, "3000000000 cents");
    }

    #[test]
    fn test_lossy_split() {
        let pitfall = lossy_split().unwrap();
        assert_eq!(pitfall.primitive, "3 x 33.33 = 99.99");
        assert_eq!(pitfall.fixed_point, "33.34 USD + 33.33 USD + 33.33 USD");
    }

    #[test]
    fn test_all_pitfalls() {
        assert_eq!(pitfalls().unwrap().len(), 5);
    }
}
