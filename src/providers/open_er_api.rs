use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::with_retry;
use crate::core::currency::{Currency, RateProvider, RateSnapshot};
use crate::core::error::RateError;

pub const DEFAULT_BASE_URL: &str = "https://open.er-api.com";

/// Daily rates from the ExchangeRate-API open access endpoint, which publishes KES.
pub struct OpenErApiRateProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay: Duration,
}

impl OpenErApiRateProvider {
    pub fn new(
        base_url: &str,
        retries: usize,
        retry_delay: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("remitlens/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(8))
            .build()?;
        Ok(OpenErApiRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retries,
            retry_delay,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    time_last_update_unix: Option<i64>,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

#[async_trait]
impl RateProvider for OpenErApiRateProvider {
    #[instrument(name = "OpenErApiRateProvider::get_rate", skip(self))]
    async fn get_rate(&self, from: Currency, to: Currency) -> Result<RateSnapshot, RateError> {
        let url = format!("{}/v6/latest/{}", self.base_url, from);
        debug!("Requesting rate table from {}", url);

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

        if data.result != "success" {
            let reason = data.error_type.unwrap_or(data.result);
            return Err(RateError::unavailable(from, to, format!("API error: {reason}")));
        }

        let as_of = data
            .time_last_update_unix
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|at| at.date_naive())
            .ok_or_else(|| RateError::unavailable(from, to, "No update time in response"))?;

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
            as_of,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_latest(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(server: &MockServer) -> OpenErApiRateProvider {
        OpenErApiRateProvider::new(&server.uri(), 0, Duration::from_millis(1)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        // 1792108800 is 2026-10-16T00:00:00Z
        let body = r#"{"result":"success","base_code":"USD","time_last_update_unix":1792108800,
            "rates":{"USD":1,"KES":129.5,"AED":3.6725}}"#;
        let server = mock_latest(200, body).await;

        let snapshot = provider(&server)
            .get_rate(Currency::USD, Currency::KES)
            .await
            .expect("Failed to get rate");

        assert_eq!(snapshot.rate, dec!(129.5));
        assert_eq!(snapshot.as_of, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
    }

    #[tokio::test]
    async fn test_api_error_result() {
        let body = r#"{"result":"error","error-type":"unsupported-code"}"#;
        let server = mock_latest(200, body).await;

        let err = provider(&server)
            .get_rate(Currency::USD, Currency::KES)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Rate unavailable for USD -> KES: API error: unsupported-code"
        );
    }

    #[tokio::test]
    async fn test_missing_rate_is_unavailable() {
        let body =
            r#"{"result":"success","time_last_update_unix":1792108800,"rates":{"EUR":0.92}}"#;
        let server = mock_latest(200, body).await;

        let err = provider(&server)
            .get_rate(Currency::USD, Currency::KES)
            .await
            .unwrap_err();
        assert!(err.to_string().ends_with("No rate in response"));
    }

    #[tokio::test]
    async fn test_http_error_is_unavailable() {
        let server = mock_latest(429, "").await;

        let err = provider(&server)
            .get_rate(Currency::USD, Currency::KES)
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Unavailable { .. }));
    }
}
