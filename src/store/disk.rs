use crate::core::cache::Cache;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<SystemTime>,
}

/// Cache persisted in a fjall partition. Values are stored as JSON.
///
/// Storage errors are logged and treated as a miss.
pub struct DiskCache<V> {
    keyspace: Keyspace,
    partition: PartitionHandle,
    _marker: PhantomData<V>,
}

impl<V> DiskCache<V> {
    pub fn open(path: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition(name, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            partition,
            _marker: PhantomData,
        })
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry<V>>>
    where
        V: DeserializeOwned,
    {
        match self.partition.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<V> Cache<String, V> for DiskCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &String) -> Option<V> {
        let entry = match self.read(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("Cache MISS for key: {:?}", key);
                return None;
            }
            Err(e) => {
                debug!("DiskCache get error for {}: {}", key, e);
                return None;
            }
        };

        if entry.expires_at.is_some_and(|at| SystemTime::now() > at) {
            debug!("Cache entry expired for key: {:?}", key);
            self.remove(key).await;
            return None;
        }
        debug!("Cache HIT for key: {:?}", key);
        Some(entry.value)
    }

    async fn put(&self, key: String, value: V, ttl: Option<Duration>) {
        let res: Result<()> = (|| {
            let expires_at = ttl.map(|d| SystemTime::now() + d);
            let entry = CacheEntry { value, expires_at };
            self.partition.insert(key.as_str(), serde_json::to_vec(&entry)?)?;
            // Written through to the journal so the next process sees it
            self.keyspace.persist(PersistMode::Buffer)?;
            Ok(())
        })();
        match res {
            Ok(()) => debug!("Cache PUT for key: {:?}", key),
            Err(e) => debug!("DiskCache put error for {}: {}", key, e),
        }
    }

    async fn remove(&self, key: &String) {
        if let Err(e) = self.partition.remove(key.as_str()) {
            debug!("DiskCache remove error for {}: {}", key, e);
        }
    }
}
