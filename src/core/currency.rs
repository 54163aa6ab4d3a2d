//! Currency codes and the exchange rate abstraction

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::{CompareError, RateError};

/// Currencies known to the tool. KES is the destination, the rest are sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    GBP,
    EUR,
    CAD,
    AUD,
    AED,
    KES,
}

impl Currency {
    pub fn all() -> &'static [Currency] {
        &[
            Currency::USD,
            Currency::GBP,
            Currency::EUR,
            Currency::CAD,
            Currency::AUD,
            Currency::AED,
            Currency::KES,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::EUR => "EUR",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::AED => "AED",
            Currency::KES => "KES",
        }
    }

    /// Number of decimal places amounts in this currency are rounded to.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::USD
            | Currency::GBP
            | Currency::EUR
            | Currency::CAD
            | Currency::AUD
            | Currency::AED
            | Currency::KES => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::all()
            .iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| CompareError::InvalidInput(format!("Unknown currency: {s}")))
    }
}

/// A single mid-market rate observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub from: Currency,
    pub to: Currency,
    /// Units of `to` per one unit of `from`.
    pub rate: Decimal,
    /// Publication date of the rate at the source.
    pub as_of: NaiveDate,
    pub fetched_at: DateTime<Utc>,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn get_rate(&self, from: Currency, to: Currency) -> Result<RateSnapshot, RateError>;
}

#[async_trait]
impl<T: RateProvider + ?Sized> RateProvider for Box<T> {
    async fn get_rate(&self, from: Currency, to: Currency) -> Result<RateSnapshot, RateError> {
        (**self).get_rate(from, to).await
    }
}
