pub mod caching;
pub mod fixed;
pub mod frankfurter;
pub mod open_er_api;
pub mod util;

pub use caching::CachingRateProvider;
pub use fixed::{FixedRate, FixedRateProvider};
pub use frankfurter::FrankfurterRateProvider;
pub use open_er_api::OpenErApiRateProvider;
