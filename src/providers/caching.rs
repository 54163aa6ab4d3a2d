use crate::core::currency::{Currency, RateProvider, RateSnapshot};
use crate::core::error::RateError;
use crate::store::RateCache;
use async_trait::async_trait;
use chrono::{Duration as DateDuration, Utc};
use std::time::Duration;
use tracing::debug;

/// Caches rate snapshots per currency pair.
///
/// Entries live for `ttl`. With `max_age_days` set, a snapshot published
/// longer ago is refused, whether it comes from the cache or a fresh fetch.
/// A failed fetch is returned as is rather than answered from an old entry.
pub struct CachingRateProvider<T: RateProvider> {
    inner: T,
    cache: RateCache,
    ttl: Duration,
    max_age_days: Option<i64>,
}

impl<T: RateProvider> CachingRateProvider<T> {
    pub fn new(inner: T, cache: RateCache, ttl: Duration, max_age_days: Option<i64>) -> Self {
        Self {
            inner,
            cache,
            ttl,
            max_age_days,
        }
    }

    /// Drops the cached entry for a pair so the next lookup refetches.
    pub async fn invalidate(&self, from: Currency, to: Currency) {
        self.cache.remove(&cache_key(from, to)).await;
    }

    fn check_fresh(&self, snapshot: &RateSnapshot) -> Result<(), RateError> {
        let Some(max_age_days) = self.max_age_days else {
            return Ok(());
        };
        let oldest = Utc::now().date_naive() - DateDuration::days(max_age_days);
        if snapshot.as_of < oldest {
            return Err(RateError::Stale {
                from: snapshot.from,
                to: snapshot.to,
                as_of: snapshot.as_of,
            });
        }
        Ok(())
    }
}

fn cache_key(from: Currency, to: Currency) -> String {
    format!("{from}-{to}")
}

#[async_trait]
impl<T: RateProvider> RateProvider for CachingRateProvider<T> {
    async fn get_rate(&self, from: Currency, to: Currency) -> Result<RateSnapshot, RateError> {
        let key = cache_key(from, to);
        if let Some(cached) = self.cache.get(&key).await {
            if self.check_fresh(&cached).is_ok() {
                debug!("Cache hit for currency rate: {}", key);
                return Ok(cached);
            }
            debug!("Cached rate for {} is stale, refetching", key);
            self.cache.remove(&key).await;
        }

        debug!("Cache miss for currency rate: {}", key);
        let snapshot = self.inner.get_rate(from, to).await?;
        self.check_fresh(&snapshot)?;
        self.cache.put(key, snapshot.clone(), Some(self.ttl)).await;
        Ok(snapshot)
    }
}
