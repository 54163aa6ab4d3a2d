pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::{AppConfig, RateSource};
use crate::core::{CompareRequest, ComparisonEngine, Currency, DeliveryMethod, RateProvider};
use crate::providers::{
    CachingRateProvider, FixedRateProvider, FrankfurterRateProvider, OpenErApiRateProvider,
};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Arguments of the `compare` command. Unset currencies fall back to the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareArgs {
    pub amount: Decimal,
    pub from: Option<Currency>,
    pub to: Option<Currency>,
    pub method: Option<DeliveryMethod>,
    pub providers: Vec<String>,
    /// Drop the cached rate and fetch a fresh one.
    pub refresh: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Compare(CompareArgs),
    Providers,
    Rates { to: Option<Currency> },
}

pub type AppRateProvider = CachingRateProvider<Box<dyn RateProvider>>;

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("remitlens starting...");

    let config = AppConfig::load_or_builtin(config_path)?;
    debug!("Loaded config: {config:#?}");

    let table = Arc::new(config.provider_table()?);
    let engine = ComparisonEngine::new(Arc::clone(&table));

    match command {
        AppCommand::Compare(args) => {
            let rates = build_rate_provider(&config)?;
            let request = compare_request(&config, args.clone());
            if args.refresh {
                rates
                    .invalidate(request.source_currency, request.dest_currency)
                    .await;
            }
            cli::compare::run(&engine, &rates, &request).await
        }
        AppCommand::Providers => {
            cli::providers::run(&table);
            Ok(())
        }
        AppCommand::Rates { to } => {
            let rates = build_rate_provider(&config)?;
            let dest = to.unwrap_or(config.destination_currency);
            cli::rates::run(&rates, &table.sources_for(dest), dest).await;
            Ok(())
        }
    }
}

fn compare_request(config: &AppConfig, args: CompareArgs) -> CompareRequest {
    let mut request = CompareRequest::new(
        args.amount,
        args.from.unwrap_or(config.default_currency),
        args.to.unwrap_or(config.destination_currency),
    );
    if let Some(method) = args.method {
        request = request.with_delivery_method(method);
    }
    if !args.providers.is_empty() {
        request = request.with_providers(args.providers);
    }
    request
}

/// The configured rate source behind a cache. Live rates are kept on disk when
/// `rates.persist` is set; fixed rates only need the in-memory cache.
pub fn build_rate_provider(config: &AppConfig) -> Result<AppRateProvider> {
    let rates = &config.rates;
    let retry_delay = Duration::from_millis(rates.retry_delay_ms);
    let inner: Box<dyn RateProvider> = match rates.source {
        RateSource::OpenErApi => Box::new(
            OpenErApiRateProvider::new(rates.base_url(), rates.retries, retry_delay)
                .context("Failed to create HTTP client")?,
        ),
        RateSource::Frankfurter => Box::new(
            FrankfurterRateProvider::new(rates.base_url(), rates.retries, retry_delay)
                .context("Failed to create HTTP client")?,
        ),
        RateSource::Fixed => Box::new(FixedRateProvider::new(rates.fixed.clone())),
    };

    let data_path = if rates.source.is_live() && rates.persist {
        Some(config.default_data_path()?)
    } else {
        None
    };
    let cache = store::open_rate_cache(data_path.as_deref());

    Ok(CachingRateProvider::new(
        inner,
        cache,
        Duration::from_secs(rates.ttl_hours * 3600),
        rates.age_limit_days(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args() -> CompareArgs {
        CompareArgs {
            amount: dec!(500),
            from: None,
            to: None,
            method: None,
            providers: Vec::new(),
            refresh: false,
        }
    }

    #[test]
    fn test_compare_request_uses_config_defaults() {
        let config = AppConfig::builtin().unwrap();
        let request = compare_request(&config, args());
        assert_eq!(request.source_currency, Currency::USD);
        assert_eq!(request.dest_currency, Currency::KES);
        assert!(request.delivery_method.is_none());
        assert!(request.providers.is_none());
    }

    #[test]
    fn test_compare_request_applies_filters() {
        let config = AppConfig::builtin().unwrap();
        let request = compare_request(
            &config,
            CompareArgs {
                from: Some(Currency::GBP),
                method: Some(DeliveryMethod::MobileMoney),
                providers: vec!["Wise".to_string()],
                ..args()
            },
        );
        assert_eq!(request.source_currency, Currency::GBP);
        assert_eq!(request.delivery_method, Some(DeliveryMethod::MobileMoney));
        assert_eq!(request.providers, Some(vec!["Wise".to_string()]));
    }
}
