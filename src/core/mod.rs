//! Core business logic: providers, rates and the comparison engine

pub mod cache;
pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod log;
pub mod provider;

// Re-export main types for cleaner imports
pub use currency::{Currency, RateProvider, RateSnapshot};
pub use engine::{CompareRequest, Comparison, ComparisonEngine, Quote};
pub use error::{CompareError, ProfileError, RateError};
pub use provider::{DeliveryMethod, FeeModel, ProviderProfile, ProviderTable, SpeedClass};
