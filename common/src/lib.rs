//! Moneta Common Types
//!
//! Value types shared across Moneta: ISO 4217 currencies, fixed-point money
//! amounts, currency pairs and conversion-rate quotes.

pub mod currency;
pub mod error;
pub mod money;
pub mod pair;
pub mod quote;
pub mod time;

pub use currency::*;
pub use error::*;
pub use money::*;
pub use pair::*;
pub use quote::*;
pub use time::*;
