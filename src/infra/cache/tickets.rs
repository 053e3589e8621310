//! Ticket, QR and ticket-list cache operations.
//!
//! Ticket metadata and QR artifacts expire together with the parent event;
//! nothing is written once the event has ended.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{keys, Cache};
use crate::config::TICKET_LIST_CACHE_TTL_SECONDS;
use crate::domain::Ticket;
use crate::errors::AppResult;

/// Remaining lifetime of a ticket entry.
///
/// `None` once the event ended or when less than a second is left, since
/// no backend may round such an entry up past the event's end.
pub fn ticket_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    (expires_at - now)
        .to_std()
        .ok()
        .filter(|ttl| ttl.as_secs() > 0)
}

impl Cache {
    pub async fn get_ticket(&self, ticket_id: i32, owner_id: i32) -> AppResult<Option<Ticket>> {
        self.get_json(&keys::ticket(ticket_id, owner_id)).await
    }

    /// Cache ticket metadata until `expires_at`. Returns false if skipped.
    pub async fn set_ticket(&self, ticket: &Ticket, expires_at: DateTime<Utc>) -> AppResult<bool> {
        let Some(ttl) = ticket_ttl(expires_at, Utc::now()) else {
            return Ok(false);
        };
        self.set_json(&keys::ticket(ticket.id, ticket.user_id), ticket, ttl)
            .await?;
        Ok(true)
    }

    pub async fn evict_ticket(&self, ticket_id: i32, owner_id: i32) -> AppResult<()> {
        self.delete(&keys::ticket(ticket_id, owner_id)).await
    }

    pub async fn evict_qr_code(&self, ticket_id: i32, owner_id: i32) -> AppResult<()> {
        self.delete(&keys::qr_code(ticket_id, owner_id)).await
    }

    /// PNG bytes of a ticket's QR code, if still cached.
    pub async fn get_qr_code(&self, ticket_id: i32, owner_id: i32) -> AppResult<Option<Vec<u8>>> {
        self.get_bytes(&keys::qr_code(ticket_id, owner_id)).await
    }

    /// Cache a QR artifact until `expires_at`. Returns false if skipped.
    pub async fn set_qr_code(
        &self,
        ticket_id: i32,
        owner_id: i32,
        png: &[u8],
        expires_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(ttl) = ticket_ttl(expires_at, Utc::now()) else {
            return Ok(false);
        };
        self.set_bytes(&keys::qr_code(ticket_id, owner_id), png, ttl)
            .await?;
        Ok(true)
    }

    pub async fn get_ticket_list(&self, owner_id: i32) -> AppResult<Option<Vec<Ticket>>> {
        self.get_json(&keys::ticket_list(owner_id)).await
    }

    pub async fn set_ticket_list(&self, owner_id: i32, tickets: &[Ticket]) -> AppResult<()> {
        self.set_json(
            &keys::ticket_list(owner_id),
            tickets,
            Duration::from_secs(TICKET_LIST_CACHE_TTL_SECONDS),
        )
        .await
    }

    pub async fn evict_ticket_list(&self, owner_id: i32) -> AppResult<()> {
        self.delete(&keys::ticket_list(owner_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn ticket(id: i32, owner: i32) -> Ticket {
        let now = Utc::now();
        Ticket {
            id,
            user_id: owner,
            event_id: 1,
            event: None,
            entered: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ticket_ttl() {
        let now = Utc::now();
        assert_eq!(
            ticket_ttl(now + ChronoDuration::seconds(90), now),
            Some(Duration::from_secs(90))
        );
        assert_eq!(ticket_ttl(now, now), None);
        assert_eq!(ticket_ttl(now - ChronoDuration::seconds(1), now), None);
    }

    #[tokio::test]
    async fn test_last_second_before_end_skips_writes() {
        let cache = Cache::in_memory();
        let almost_over = Utc::now() + ChronoDuration::milliseconds(400);

        assert_eq!(ticket_ttl(almost_over, Utc::now()), None);
        assert!(!cache.set_ticket(&ticket(1, 2), almost_over).await.unwrap());
        assert!(!cache.set_qr_code(1, 2, b"png", almost_over).await.unwrap());
        assert_eq!(cache.get_qr_code(1, 2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_qr_eviction_leaves_metadata() {
        let cache = Cache::in_memory();
        let future = Utc::now() + ChronoDuration::hours(1);
        cache.set_ticket(&ticket(1, 2), future).await.unwrap();
        cache.set_qr_code(1, 2, b"png", future).await.unwrap();

        cache.evict_qr_code(1, 2).await.unwrap();

        assert!(cache.get_qr_code(1, 2).await.unwrap().is_none());
        assert!(cache.get_ticket(1, 2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ended_event_skips_writes() {
        let cache = Cache::in_memory();
        let past = Utc::now() - ChronoDuration::minutes(5);

        assert!(!cache.set_ticket(&ticket(1, 2), past).await.unwrap());
        assert!(!cache.set_qr_code(1, 2, b"png", past).await.unwrap());
        assert_eq!(cache.get_ticket(1, 2).await.unwrap(), None);
        assert_eq!(cache.get_qr_code(1, 2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ticket_entries_are_owner_scoped() {
        let cache = Cache::in_memory();
        let future = Utc::now() + ChronoDuration::hours(1);

        assert!(cache.set_ticket(&ticket(1, 2), future).await.unwrap());
        assert!(cache.get_ticket(1, 2).await.unwrap().is_some());
        assert!(cache.get_ticket(1, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ticket_list_round_trip() {
        let cache = Cache::in_memory();
        cache
            .set_ticket_list(2, &[ticket(1, 2), ticket(5, 2)])
            .await
            .unwrap();

        let list = cache.get_ticket_list(2).await.unwrap().unwrap();
        assert_eq!(list.len(), 2);

        cache.evict_ticket_list(2).await.unwrap();
        assert!(cache.get_ticket_list(2).await.unwrap().is_none());
    }
}
