//! Event cache operations.

use chrono::Utc;

use super::{keys, Cache};
use crate::domain::Event;
use crate::errors::AppResult;

impl Cache {
    pub async fn get_event(&self, event_id: i32) -> AppResult<Option<Event>> {
        self.get_json(&keys::event(event_id)).await
    }

    /// Every cached event that still decodes, most recently updated first.
    ///
    /// Entries that fail to load are skipped rather than failing the read.
    pub async fn get_all_events(&self) -> AppResult<Vec<Event>> {
        let keys = self.backend.keys(&keys::all_events()).await?;

        let mut events = Vec::with_capacity(keys.len());
        for key in keys {
            match self.get_json::<Event>(&key).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => tracing::debug!(key = %key, error = %e, "Skipping cached event"),
            }
        }

        events.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(events)
    }

    /// Cache an event until it ends.
    pub async fn set_event(&self, event: &Event) -> AppResult<()> {
        let ttl = event.cache_ttl(Utc::now());
        self.set_json(&keys::event(event.id), event, ttl).await
    }

    pub async fn evict_event(&self, event_id: i32) -> AppResult<()> {
        self.delete(&keys::event(event_id)).await
    }
}
