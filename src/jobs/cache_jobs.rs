//! Cache population and eviction jobs.
//!
//! Each job is a self-contained unit of cache work run by the
//! [`JobQueue`](super::JobQueue). Failures are returned to the queue, which
//! logs and counts them; they never reach a client.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::CACHE_WRITE_PACING_MS;
use crate::domain::{Event, Ticket};
use crate::errors::AppResult;
use crate::infra::Cache;

/// A unit of cache work.
#[derive(Debug, Clone)]
pub enum CacheJob {
    /// Cache one event until it ends
    StoreEvent(Event),
    /// Cache many events, pacing the writes
    StoreEvents(Vec<Event>),
    EvictEvent(i32),
    /// Cache ticket metadata and, when present, its QR artifact
    StoreTicket {
        ticket: Ticket,
        qr_code: Option<Vec<u8>>,
        expires_at: DateTime<Utc>,
    },
    StoreTicketList {
        owner_id: i32,
        tickets: Vec<Ticket>,
    },
    EvictTicket {
        ticket_id: i32,
        owner_id: i32,
    },
    EvictTicketList(i32),
    EvictQrCode {
        ticket_id: i32,
        owner_id: i32,
    },
}

impl CacheJob {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            CacheJob::StoreEvent(_) => "store_event",
            CacheJob::StoreEvents(_) => "store_events",
            CacheJob::EvictEvent(_) => "evict_event",
            CacheJob::StoreTicket { .. } => "store_ticket",
            CacheJob::StoreTicketList { .. } => "store_ticket_list",
            CacheJob::EvictTicket { .. } => "evict_ticket",
            CacheJob::EvictTicketList(_) => "evict_ticket_list",
            CacheJob::EvictQrCode { .. } => "evict_qr_code",
        }
    }

    /// Whether the job carries data the store cannot reproduce.
    ///
    /// Only a freshly rendered QR artifact qualifies; everything else can be
    /// rebuilt by the next read.
    pub fn is_durable(&self) -> bool {
        matches!(
            self,
            CacheJob::StoreTicket {
                qr_code: Some(_),
                ..
            }
        )
    }

    /// Execute the job against the cache.
    pub async fn run(self, cache: &Cache) -> AppResult<()> {
        match self {
            CacheJob::StoreEvent(event) => cache.set_event(&event).await,
            CacheJob::StoreEvents(events) => store_events_paced(cache, events).await,
            CacheJob::EvictEvent(event_id) => cache.evict_event(event_id).await,
            CacheJob::StoreTicket {
                ticket,
                qr_code,
                expires_at,
            } => {
                if !cache.set_ticket(&ticket, expires_at).await? {
                    tracing::debug!(ticket_id = ticket.id, "Event ended, ticket not cached");
                    return Ok(());
                }
                if let Some(png) = qr_code {
                    cache
                        .set_qr_code(ticket.id, ticket.user_id, &png, expires_at)
                        .await?;
                }
                Ok(())
            }
            CacheJob::StoreTicketList { owner_id, tickets } => {
                cache.set_ticket_list(owner_id, &tickets).await
            }
            CacheJob::EvictTicket {
                ticket_id,
                owner_id,
            } => cache.evict_ticket(ticket_id, owner_id).await,
            CacheJob::EvictTicketList(owner_id) => cache.evict_ticket_list(owner_id).await,
            CacheJob::EvictQrCode {
                ticket_id,
                owner_id,
            } => cache.evict_qr_code(ticket_id, owner_id).await,
        }
    }
}

/// Write events one by one so a bulk refill does not flood the backend.
///
/// A failed write is logged and the remaining events are still written.
async fn store_events_paced(cache: &Cache, events: Vec<Event>) -> AppResult<()> {
    let pacing = Duration::from_millis(CACHE_WRITE_PACING_MS);
    let total = events.len();

    for (index, event) in events.into_iter().enumerate() {
        if let Err(e) = cache.set_event(&event).await {
            tracing::warn!(event_id = event.id, error = %e, "Failed to cache event");
        }
        if index + 1 < total {
            tokio::time::sleep(pacing).await;
        }
    }

    Ok(())
}
