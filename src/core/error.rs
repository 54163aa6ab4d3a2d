//! Error types for comparisons, rate lookups and provider configuration.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::core::currency::Currency;

/// Failures of the rate adapter. Never papered over with a default rate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error("Rate unavailable for {from} -> {to}: {reason}")]
    Unavailable {
        from: Currency,
        to: Currency,
        reason: String,
    },

    #[error("Rate for {from} -> {to} is stale (as of {as_of})")]
    Stale {
        from: Currency,
        to: Currency,
        as_of: NaiveDate,
    },
}

impl RateError {
    pub fn unavailable(from: Currency, to: Currency, reason: impl Into<String>) -> Self {
        RateError::Unavailable {
            from,
            to,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the comparison engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    RateUnavailable(#[from] RateError),

    #[error("No providers available for {from} -> {to}")]
    NoProvidersAvailable { from: Currency, to: Currency },

    /// Scoped to one provider; the engine drops that provider from the result.
    #[error("Fee {fee} charged by {provider} exceeds the amount sent ({amount})")]
    FeeExceedsAmount {
        provider: String,
        fee: Decimal,
        amount: Decimal,
    },
}

/// Provider table validation failures. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("Provider table is empty")]
    EmptyTable,

    #[error("Provider name must not be empty")]
    EmptyName,

    #[error("Duplicate provider name: {0}")]
    DuplicateName(String),

    #[error("Provider {name}: spread_percent must be in [0, 100), got {spread}")]
    InvalidSpread { name: String, spread: Decimal },

    #[error("Provider {name}: fee parameters must be non-negative")]
    NegativeFee { name: String },

    #[error("Provider {0}: at least one delivery option is required")]
    NoDeliveryOptions(String),

    #[error("Provider {0}: at least one corridor is required")]
    NoCorridors(String),

    #[error("Provider {name}: corridor {currency} -> {currency} converts nothing")]
    DegenerateCorridor { name: String, currency: Currency },
}
