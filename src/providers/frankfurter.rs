use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::with_retry;
use crate::core::currency::{Currency, RateProvider, RateSnapshot};
use crate::core::error::RateError;

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Mid-market rates from the Frankfurter API (ECB reference rates, published daily).
///
/// The ECB does not publish KES or AED, so this only serves a Frankfurter
/// compatible server that carries them.
pub struct FrankfurterRateProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay: Duration,
}

impl FrankfurterRateProvider {
    pub fn new(
        base_url: &str,
        retries: usize,
        retry_delay: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("remitlens/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(8))
            .build()?;
        Ok(FrankfurterRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retries,
            retry_delay,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    date: NaiveDate,
    rates: HashMap<String, Decimal>,
}

#[async_trait]
impl RateProvider for FrankfurterRateProvider {
    #[instrument(name = "FrankfurterRateProvider::get_rate", skip(self))]
    async fn get_rate(&self, from: Currency, to: Currency) -> Result<RateSnapshot, RateError> {
        let url = format!("{}/latest?from={}&to={}", self.base_url, from, to);
        debug!("Requesting mid-market rate from {}", url);

        let response = with_retry(
            || self.client.get(&url).send(),
            self.retries,
            self.retry_delay,
        )
        .await
        .map_err(|e| RateError::unavailable(from, to, format!("Request error: {e}")))?;

        if !response.status().is_success() {
            return Err(RateError::unavailable(
                from,
                to,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RateError::unavailable(from, to, format!("Failed to read body: {e}")))?;

        let data: LatestResponse = serde_json::from_str(&text).map_err(|e| {
            RateError::unavailable(from, to, format!("Failed to parse JSON response: {e}"))
        })?;

        let rate = data
            .rates
            .get(to.code())
            .copied()
            .ok_or_else(|| RateError::unavailable(from, to, "No rate in response"))?;

        if rate <= Decimal::ZERO {
            return Err(RateError::unavailable(
                from,
                to,
                format!("Non-positive rate: {rate}"),
            ));
        }

        Ok(RateSnapshot {
            from,
            to,
            rate,
            as_of: data.date,
            fetched_at: Utc::now(),
        })
    }
}
