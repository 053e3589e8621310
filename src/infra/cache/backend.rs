//! Key-value backend abstraction behind the cache layer.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Raw operations the cache layer needs from its backing store.
///
/// Values are opaque bytes; typed access lives on [`super::Cache`].
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Store a value that expires after `ttl`.
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// List keys matching a glob pattern (`*` and `?` wildcards).
    async fn keys(&self, pattern: &str) -> AppResult<Vec<String>>;

    /// Set fields on a hash, creating it if needed.
    async fn hash_set(&self, key: &str, fields: Vec<(String, String)>) -> AppResult<()>;

    /// Read every field of a hash; a missing key yields an empty map.
    async fn hash_get_all(&self, key: &str) -> AppResult<HashMap<String, String>>;

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> AppResult<()>;
}
