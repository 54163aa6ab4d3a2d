pub mod disk;
pub mod memory;

use crate::core::cache::Cache;
use crate::core::currency::RateSnapshot;
use disk::DiskCache;
use memory::MemoryCache;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub type RateCache = Arc<dyn Cache<String, RateSnapshot>>;

const RATE_PARTITION: &str = "rates";

/// Opens the rate cache, on disk under `data_path` when given.
///
/// Falls back to an in-memory cache if the on-disk store cannot be opened.
pub fn open_rate_cache(data_path: Option<&Path>) -> RateCache {
    match data_path {
        Some(path) => {
            let cache_dir = path.join("cache");
            match DiskCache::<RateSnapshot>::open(&cache_dir, RATE_PARTITION) {
                Ok(cache) => {
                    debug!("Using rate cache at {}", cache_dir.display());
                    Arc::new(cache)
                }
                Err(e) => {
                    warn!(error = %e, "Could not open rate cache, using memory");
                    Arc::new(MemoryCache::new())
                }
            }
        }
        None => Arc::new(MemoryCache::new()),
    }
}
