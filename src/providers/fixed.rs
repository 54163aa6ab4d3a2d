use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::currency::{Currency, RateProvider, RateSnapshot};
use crate::core::error::RateError;

/// A manually maintained rate, dated so staleness can be checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
    pub as_of: NaiveDate,
}

/// Serves rates from a table kept in the configuration file.
pub struct FixedRateProvider {
    rates: Vec<FixedRate>,
}

impl FixedRateProvider {
    pub fn new(rates: Vec<FixedRate>) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn get_rate(&self, from: Currency, to: Currency) -> Result<RateSnapshot, RateError> {
        let entry = self
            .rates
            .iter()
            .find(|r| r.from == from && r.to == to)
            .ok_or_else(|| RateError::unavailable(from, to, "No configured rate"))?;

        if entry.rate <= Decimal::ZERO {
            return Err(RateError::unavailable(
                from,
                to,
                format!("Non-positive configured rate: {}", entry.rate),
            ));
        }

        Ok(RateSnapshot {
            from,
            to,
            rate: entry.rate,
            as_of: entry.as_of,
            fetched_at: Utc::now(),
        })
    }
}
