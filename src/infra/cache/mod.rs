//! Cache layer.
//!
//! A typed, best-effort cache over a pluggable key-value backend. Nothing
//! stored here is authoritative; every entry can be rebuilt from the
//! relational store except QR artifacts, which live only here.

mod backend;
mod events;
pub mod keys;
mod memory;
mod redis_cache;
mod sessions;
mod tickets;

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::config::{CacheBackendKind, Config};
use crate::errors::{AppError, AppResult};

pub use backend::CacheBackend;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use sessions::Session;
pub use tickets::ticket_ttl;

#[cfg(any(test, feature = "test-utils"))]
pub use backend::MockCacheBackend;

/// Typed cache wrapper shared across services and jobs.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Cache backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// Build the backend selected by configuration.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        match config.cache_backend {
            CacheBackendKind::Redis => {
                let redis = RedisCache::connect(&config.redis_url)
                    .await
                    .map_err(|e| AppError::cache(format!("Redis connection failed: {}", e)))?;
                Ok(Self::new(Arc::new(redis)))
            }
            CacheBackendKind::Memory => {
                tracing::info!("Using in-memory cache backend");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Read and decode a JSON value. Undecodable entries count as misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    /// Encode a value as JSON and store it with an expiration.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()> {
        let json = serde_json::to_vec(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;
        self.backend.set_ex(key, &json, ttl).await
    }

    pub async fn get_bytes(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        self.backend.get(key).await
    }

    pub async fn set_bytes(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        self.backend.set_ex(key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.backend.delete(key).await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.backend.ping().await
    }
}
