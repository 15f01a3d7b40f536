//! Key/value cache used by the preference lookups.
//!
//! `PreferenceLookup` holds an `Arc<dyn Cache>`: `RedisCache` when `REDIS_URL` is
//! configured, `MemoryCache` otherwise (and in tests). Values are opaque
//! strings; callers serialize with serde_json.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use redis::Client as RedisClient;
use tokio::time::Instant;

use crate::errors::AppError;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Stores `value`, applying the cache's configured expiry if any.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Atomically increments an integer counter, creating it at 1. Counters never expire.
    async fn incr(&self, key: &str) -> Result<i64, AppError>;

    /// Removes every key starting with `prefix`, returning how many were dropped.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, AppError>;
}

pub struct RedisCache {
    client: RedisClient,
    ttl: Option<Duration>,
}

impl RedisCache {
    pub fn new(client: RedisClient, ttl: Option<Duration>) -> Self {
        Self { client, ttl }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection().await?;
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = self.ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, AppError> {
        let mut conn = self.connection().await?;
        let value = redis::cmd("INCR")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, AppError> {
        let mut conn = self.connection().await?;
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async::<_, (u64, Vec<String>)>(&mut conn)
                .await?;
            if !keys.is_empty() {
                removed += redis::cmd("DEL")
                    .arg(&keys)
                    .query_async::<_, u64>(&mut conn)
                    .await?;
            }
            if next == 0 {
                return Ok(removed);
            }
            cursor = next;
        }
    }
}

/// In-process cache. Entries are dropped lazily on read once expired.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Option<Instant>)>>, AppError>
    {
        self.entries
            .lock()
            .map_err(|_| AppError::Cache("memory cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some((_, Some(deadline))) => Instant::now() >= *deadline,
            Some((_, None)) => false,
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let deadline = self.ttl.map(|ttl| Instant::now() + ttl);
        self.lock()?
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, AppError> {
        let mut entries = self.lock()?;
        let current = match entries.get(key) {
            Some((value, _)) => value
                .parse::<i64>()
                .map_err(|_| AppError::Cache(format!("value at '{key}' is not an integer")))?,
            None => 0,
        };
        let next = current + 1;
        entries.insert(key.to_string(), (next.to_string(), None));
        Ok(next)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, AppError> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_set_get_delete() {
        let cache = MemoryCache::new(None);
        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.set("k", "v").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_incr_starts_at_one() {
        let cache = MemoryCache::new(None);
        assert_eq!(cache.incr("gen").await.unwrap(), 1);
        assert_eq!(cache.incr("gen").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_memory_cache_incr_rejects_non_integer() {
        let cache = MemoryCache::new(None);
        cache.set("gen", "abc").await.unwrap();
        assert!(cache.incr("gen").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_cache_ttl_expires_entries() {
        let cache = MemoryCache::new(Some(Duration::from_secs(30)));
        cache.set("k", "v").await.unwrap();
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cache.get("k").await.unwrap().is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_delete_prefix_keeps_other_keys() {
        let cache = MemoryCache::new(None);
        cache.set("skills_v1_a", "x").await.unwrap();
        cache.set("skills_v1_b", "y").await.unwrap();
        cache.set("positions_a", "z").await.unwrap();
        assert_eq!(cache.delete_prefix("skills_").await.unwrap(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("positions_a").await.unwrap().is_some());
    }
}
