//! True-cost comparison of remittance providers.
//!
//! The engine is a pure function of the request, the mid-market rate and the
//! provider table. It never fetches rates itself; [`ComparisonEngine::compare_with_rates`]
//! only resolves the rate first and hands it to [`ComparisonEngine::compare`].

use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::currency::{Currency, RateProvider, RateSnapshot};
use crate::core::error::CompareError;
use crate::core::provider::{DeliveryMethod, ProviderProfile, ProviderTable, SpeedClass};

const DISPLAY_DECIMALS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    pub source_amount: Decimal,
    pub source_currency: Currency,
    pub dest_currency: Currency,
    pub delivery_method: Option<DeliveryMethod>,
    /// Restrict the comparison to these provider names.
    pub providers: Option<Vec<String>>,
}

impl CompareRequest {
    pub fn new(source_amount: Decimal, source_currency: Currency, dest_currency: Currency) -> Self {
        Self {
            source_amount,
            source_currency,
            dest_currency,
            delivery_method: None,
            providers: None,
        }
    }

    pub fn with_delivery_method(mut self, method: DeliveryMethod) -> Self {
        self.delivery_method = Some(method);
        self
    }

    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers = Some(providers);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub provider_name: String,
    pub source_amount: Decimal,
    pub source_currency: Currency,
    pub dest_currency: Currency,
    pub fee_amount: Decimal,
    pub mid_market_rate: Decimal,
    pub spread_percent: Decimal,
    pub effective_rate: Decimal,
    pub amount_after_fee: Decimal,
    pub recipient_gets: Decimal,
    /// Unrounded. Use [`Quote::true_cost_percent_display`] for presentation.
    pub true_cost_percent: Decimal,
    pub delivery_speed: SpeedClass,
    pub delivery_methods: Vec<DeliveryMethod>,
    pub url: Option<String>,
}

impl Quote {
    pub fn true_cost_percent_display(&self) -> Decimal {
        round_half_even(self.true_cost_percent, DISPLAY_DECIMALS)
    }

    pub fn offers(&self, method: DeliveryMethod) -> bool {
        self.delivery_methods.contains(&method)
    }

    /// What the recipient would get at mid-market with no fee, minus what they get.
    pub fn shortfall_vs_mid_market(&self) -> Decimal {
        self.source_amount * self.mid_market_rate - self.recipient_gets
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub source_amount: Decimal,
    pub source_currency: Currency,
    pub dest_currency: Currency,
    pub mid_market_rate: Decimal,
    pub delivery_method: Option<DeliveryMethod>,
    /// Ascending by displayed true cost, ties by provider name.
    pub quotes: Vec<Quote>,
    pub best_overall: Quote,
    pub best_to_mpesa: Option<Quote>,
    pub fastest: Quote,
}

impl Comparison {
    /// Value of the source amount at the mid-market rate, in the destination currency.
    pub fn mid_market_value(&self) -> Decimal {
        self.source_amount * self.mid_market_rate
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    table: Arc<ProviderTable>,
}

impl ComparisonEngine {
    pub fn new(table: Arc<ProviderTable>) -> Self {
        Self { table }
    }

    /// Resolves the mid-market rate through `rates`, then compares.
    ///
    /// No rate is requested when no provider serves the request. Rate failures
    /// are returned unchanged as [`CompareError::RateUnavailable`].
    pub async fn compare_with_rates(
        &self,
        rates: &dyn RateProvider,
        request: &CompareRequest,
    ) -> Result<(RateSnapshot, Comparison), CompareError> {
        validate_request(request)?;
        if self.eligible(request).is_empty() {
            self.warn_unknown_providers(request);
            return Err(no_providers(request));
        }
        let snapshot = rates
            .get_rate(request.source_currency, request.dest_currency)
            .await?;
        debug!(rate = %snapshot.rate, as_of = %snapshot.as_of, "Resolved mid-market rate");
        let comparison = self.compare(request, snapshot.rate)?;
        Ok((snapshot, comparison))
    }

    pub fn compare(
        &self,
        request: &CompareRequest,
        mid_market_rate: Decimal,
    ) -> Result<Comparison, CompareError> {
        validate_request(request)?;
        if mid_market_rate <= Decimal::ZERO {
            return Err(CompareError::InvalidInput(format!(
                "Mid-market rate must be positive, got {mid_market_rate}"
            )));
        }

        self.warn_unknown_providers(request);

        let eligible = self.eligible(request);
        let mut quotes = Vec::with_capacity(eligible.len());
        for profile in eligible {
            match quote_provider(profile, request, mid_market_rate) {
                Ok(quote) => quotes.push(quote),
                Err(e @ CompareError::FeeExceedsAmount { .. }) => {
                    debug!(provider = %profile.name, error = %e, "Dropping provider")
                }
                Err(e) => return Err(e),
            }
        }

        quotes.sort_by(by_cost_then_name);

        let best_overall = quotes
            .first()
            .cloned()
            .ok_or_else(|| no_providers(request))?;
        let best_to_mpesa = quotes
            .iter()
            .find(|q| q.offers(DeliveryMethod::MobileMoney))
            .cloned();
        let fastest = quotes
            .iter()
            .min_by(|a, b| {
                a.delivery_speed
                    .cmp(&b.delivery_speed)
                    .then_with(|| by_cost_then_name(a, b))
            })
            .cloned()
            .ok_or_else(|| no_providers(request))?;

        debug!(
            quotes = quotes.len(),
            best = %best_overall.provider_name,
            "Comparison complete"
        );

        Ok(Comparison {
            source_amount: request.source_amount,
            source_currency: request.source_currency,
            dest_currency: request.dest_currency,
            mid_market_rate,
            delivery_method: request.delivery_method,
            quotes,
            best_overall,
            best_to_mpesa,
            fastest,
        })
    }

    /// Profiles serving the corridor, delivery method and name subset of `request`.
    fn eligible(&self, request: &CompareRequest) -> Vec<&ProviderProfile> {
        self.table
            .profiles()
            .iter()
            .filter(|p| p.supports(request.source_currency, request.dest_currency))
            .filter(|p| request.delivery_method.is_none_or(|m| p.offers(m)))
            .filter(|p| {
                request
                    .providers
                    .as_ref()
                    .is_none_or(|names| names.iter().any(|n| *n == p.name))
            })
            .collect()
    }

    fn warn_unknown_providers(&self, request: &CompareRequest) {
        if let Some(names) = &request.providers {
            for name in names.iter().filter(|n| self.table.get(n).is_none()) {
                warn!(provider = %name, "Ignoring unknown provider");
            }
        }
    }
}

fn no_providers(request: &CompareRequest) -> CompareError {
    CompareError::NoProvidersAvailable {
        from: request.source_currency,
        to: request.dest_currency,
    }
}

fn validate_request(request: &CompareRequest) -> Result<(), CompareError> {
    if request.source_amount <= Decimal::ZERO {
        return Err(CompareError::InvalidInput(format!(
            "Amount must be positive, got {}",
            request.source_amount
        )));
    }
    if request.source_currency == request.dest_currency {
        return Err(CompareError::InvalidInput(format!(
            "Source and destination currency are both {}",
            request.source_currency
        )));
    }
    Ok(())
}

/// Prices a single provider. Fails with `FeeExceedsAmount` when nothing would be left to send,
/// and with `InvalidInput` when the amount is too large to price.
pub fn quote_provider(
    profile: &ProviderProfile,
    request: &CompareRequest,
    mid_market_rate: Decimal,
) -> Result<Quote, CompareError> {
    let source_amount = request.source_amount;
    let too_large =
        || CompareError::InvalidInput(format!("Amount {source_amount} is too large to compare"));

    let fee_amount = profile.fee.fee_for(source_amount).ok_or_else(too_large)?;
    if fee_amount >= source_amount {
        return Err(CompareError::FeeExceedsAmount {
            provider: profile.name.clone(),
            fee: fee_amount,
            amount: source_amount,
        });
    }

    let effective_rate = mid_market_rate
        .checked_mul(Decimal::ONE - profile.spread_percent / Decimal::ONE_HUNDRED)
        .ok_or_else(too_large)?;
    let amount_after_fee = source_amount - fee_amount;
    let recipient_gets = round_half_even(
        amount_after_fee
            .checked_mul(effective_rate)
            .ok_or_else(too_large)?,
        request.dest_currency.decimal_places(),
    );
    let mid_market_value = source_amount
        .checked_mul(mid_market_rate)
        .ok_or_else(too_large)?;
    let true_cost_percent = recipient_gets
        .checked_div(mid_market_value)
        .map(|share| (Decimal::ONE - share) * Decimal::ONE_HUNDRED)
        .ok_or_else(|| {
            CompareError::InvalidInput(format!("Amount {source_amount} is too small to compare"))
        })?;

    // Filtering guarantees a matching option exists; fall back to the overall fastest.
    let delivery_speed = profile
        .fastest_speed(request.delivery_method)
        .or_else(|| profile.fastest_speed(None))
        .unwrap_or(SpeedClass::Days);

    Ok(Quote {
        provider_name: profile.name.clone(),
        source_amount,
        source_currency: request.source_currency,
        dest_currency: request.dest_currency,
        fee_amount,
        mid_market_rate,
        spread_percent: profile.spread_percent,
        effective_rate,
        amount_after_fee,
        recipient_gets,
        true_cost_percent,
        delivery_speed,
        delivery_methods: profile.methods(),
        url: profile.transfer_url(source_amount, request.source_currency, request.dest_currency),
    })
}

pub fn round_half_even(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven)
}

/// Costs equal to two decimals rank by name.
fn by_cost_then_name(a: &Quote, b: &Quote) -> Ordering {
    a.true_cost_percent_display()
        .cmp(&b.true_cost_percent_display())
        .then_with(|| a.provider_name.cmp(&b.provider_name))
}
