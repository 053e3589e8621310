//! In-process cache backend for development and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::backend::CacheBackend;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// HashMap-backed cache. Expired entries are hidden from reads and removed
/// on every write and key scan.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn live(&self, key: &str) -> Option<Entry> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .cloned()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        match self.live(key).await.map(|entry| entry.value) {
            Some(Value::Bytes(bytes)) => Ok(Some(bytes)),
            Some(Value::Hash(_)) => Err(AppError::cache(format!(
                "WRONGTYPE key {} holds a hash",
                key
            ))),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let entry = Entry {
            value: Value::Bytes(value.to_vec()),
            expires_at: Some(now + ttl),
        };
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, now);
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> AppResult<Vec<String>> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, now);
        Ok(entries
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn hash_set(&self, key: &str, fields: Vec<(String, String)>) -> AppResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, now);
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: Value::Hash(HashMap::new()),
                expires_at: None,
            });

        match &mut entry.value {
            Value::Hash(hash) => {
                hash.extend(fields);
                Ok(())
            }
            Value::Bytes(_) => Err(AppError::cache(format!(
                "WRONGTYPE key {} holds a plain value",
                key
            ))),
        }
    }

    async fn hash_get_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        match self.live(key).await.map(|entry| entry.value) {
            Some(Value::Hash(hash)) => Ok(hash),
            Some(Value::Bytes(_)) => Err(AppError::cache(format!(
                "WRONGTYPE key {} holds a plain value",
                key
            ))),
            None => Ok(HashMap::new()),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            if entry.is_live(now) {
                entry.expires_at = Some(now + ttl);
            }
        }
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>, now: Instant) {
    entries.retain(|_, entry| entry.is_live(now));
}

/// Redis-style glob match supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
