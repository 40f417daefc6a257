use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPayload {
    pub key: String,
    pub payload: String,
    pub expires_at: i64,
}

/// Response cache backend. `now` and `expires_at` are unix seconds.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_cache(&self, key: &str, now: i64) -> Result<Option<String>>;
    async fn put_cache(&self, key: &str, payload: &str, expires_at: i64) -> Result<()>;
    /// Remove entries whose key starts with `prefix` (all when `None`).
    async fn clear_cache_prefix(&self, prefix: Option<&str>) -> Result<u64>;
}

/// Process-local cache. Locks are held only for the map operation.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, CachedPayload>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_cache(&self, key: &str, now: i64) -> Result<Option<String>> {
        let map = self.entries.read().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        Ok(map.get(key).filter(|e| e.expires_at > now).map(|e| e.payload.clone()))
    }

    async fn put_cache(&self, key: &str, payload: &str, expires_at: i64) -> Result<()> {
        let mut map = self.entries.write().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        map.insert(key.to_string(), CachedPayload { key: key.to_string(), payload: payload.to_string(), expires_at });
        Ok(())
    }

    async fn clear_cache_prefix(&self, prefix: Option<&str>) -> Result<u64> {
        let mut map = self.entries.write().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        let before = map.len();
        match prefix {
            Some(p) => map.retain(|k, _| !k.starts_with(p)),
            None => map.clear(),
        }
        Ok((before - map.len()) as u64)
    }
}
