//! Redis cache backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use super::backend::CacheBackend;
use crate::errors::{AppError, AppResult};

/// Redis backend with an auto-reconnecting connection manager.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(cache_error)?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl))
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await.map_err(cache_error)?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.keys(pattern).await.map_err(cache_error)?;
        Ok(keys)
    }

    async fn hash_set(&self, key: &str, fields: Vec<(String, String)>) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .hset_multiple(key, &fields)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        let mut conn = self.connection.clone();
        let fields: HashMap<String, String> = conn.hgetall(key).await.map_err(cache_error)?;
        Ok(fields)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .pexpire(key, ttl_millis(ttl) as i64)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

/// Expirations are sent in milliseconds; Redis rejects zero.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn cache_error(e: RedisError) -> AppError {
    AppError::cache(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_keeps_sub_second_precision() {
        assert_eq!(ttl_millis(Duration::from_millis(200)), 200);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::from_secs(90)), 90_000);
    }
}
