//! Ticket service - purchase, lookup and gate validation.
//!
//! The QR artifact is rendered once at purchase and lives only in the cache,
//! expiring with the event. Its write is submitted to the job queue so it is
//! never dropped silently: if the queue cannot take it, the purchase fails.
//! Reads never regenerate it: a ticket whose QR entry is gone is reported as
//! expired.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::qr_service::QrEncoder;
use crate::domain::{CreateTicket, ExpiredQr, Ticket, TicketView, TicketWithQr, ValidateTicket};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{Cache, UnitOfWork};
use crate::jobs::{CacheJob, JobQueue};
use crate::utils::with_timeout;

pub const QR_EXPIRED_MESSAGE: &str = "Event has ended";

/// Reported when the QR entry is gone although the event is still running
pub const QR_UNAVAILABLE_MESSAGE: &str = "QR code is no longer available";

#[async_trait]
pub trait TicketService: Send + Sync {
    /// Tickets of `owner_id`, most recently updated first
    async fn get_many(&self, owner_id: i32) -> AppResult<Vec<Ticket>>;

    /// One ticket of `owner_id` together with its QR state
    async fn get_one(&self, id: i32, owner_id: i32) -> AppResult<TicketView>;

    /// Purchase a ticket for an event that has not ended
    async fn create_one(&self, owner_id: i32, input: CreateTicket) -> AppResult<Ticket>;

    /// Mark a ticket as entered; safe to repeat
    async fn validate_one(&self, input: ValidateTicket) -> AppResult<Ticket>;
}

/// Concrete implementation of TicketService using Unit of Work.
pub struct TicketManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Cache,
    jobs: JobQueue,
    qr: QrEncoder,
    timeout: Duration,
}

impl<U: UnitOfWork> TicketManager<U> {
    pub fn new(
        uow: Arc<U>,
        cache: Cache,
        jobs: JobQueue,
        qr: QrEncoder,
        timeout: Duration,
    ) -> Self {
        Self {
            uow,
            cache,
            jobs,
            qr,
            timeout,
        }
    }

    /// Schedule invalidation of every entry derived from this ticket.
    fn invalidate(&self, ticket: &Ticket) {
        self.jobs.enqueue(CacheJob::EvictTicket {
            ticket_id: ticket.id,
            owner_id: ticket.user_id,
        });
        self.jobs.enqueue(CacheJob::EvictTicketList(ticket.user_id));
        self.jobs.enqueue(CacheJob::EvictEvent(ticket.event_id));
    }
}

#[async_trait]
impl<U: UnitOfWork> TicketService for TicketManager<U> {
    async fn get_many(&self, owner_id: i32) -> AppResult<Vec<Ticket>> {
        with_timeout(self.timeout, async {
            match self.cache.get_ticket_list(owner_id).await {
                Ok(Some(tickets)) => return Ok(tickets),
                Ok(None) => {}
                Err(e) => tracing::warn!(owner_id, error = %e, "Ticket list cache read failed"),
            }

            let tickets = self.uow.tickets().list_for_owner(owner_id).await?;
            self.jobs.enqueue(CacheJob::StoreTicketList {
                owner_id,
                tickets: tickets.clone(),
            });
            Ok(tickets)
        })
        .await
    }

    async fn get_one(&self, id: i32, owner_id: i32) -> AppResult<TicketView> {
        with_timeout(self.timeout, async {
            let cached = match self.cache.get_ticket(id, owner_id).await {
                Ok(ticket) => ticket,
                Err(e) => {
                    tracing::warn!(ticket_id = id, error = %e, "Ticket cache read failed");
                    None
                }
            };

            let ticket = match cached {
                Some(ticket) => ticket,
                None => {
                    let ticket = self
                        .uow
                        .tickets()
                        .find_for_owner(id, owner_id)
                        .await?
                        .ok_or_not_found("Ticket")?;

                    if let Some(event) = &ticket.event {
                        self.jobs.enqueue(CacheJob::StoreTicket {
                            ticket: ticket.clone(),
                            qr_code: None,
                            expires_at: event.end_date,
                        });
                    }
                    ticket
                }
            };

            let view = match self.cache.get_qr_code(id, owner_id).await? {
                Some(png) => TicketView::Active(TicketWithQr {
                    ticket,
                    qrcode: STANDARD.encode(png),
                }),
                None => {
                    let ended = ticket
                        .event
                        .as_ref()
                        .map_or(false, |event| event.has_ended(Utc::now()));
                    if ended {
                        tracing::debug!(ticket_id = id, "QR code expired with its event");
                    } else {
                        tracing::warn!(ticket_id = id, "QR code missing for a running event");
                    }

                    let message = if ended {
                        QR_EXPIRED_MESSAGE
                    } else {
                        QR_UNAVAILABLE_MESSAGE
                    };
                    TicketView::QrExpired(ExpiredQr {
                        ticket,
                        message: message.to_string(),
                    })
                }
            };
            Ok(view)
        })
        .await
    }

    async fn create_one(&self, owner_id: i32, input: CreateTicket) -> AppResult<Ticket> {
        let (mut ticket, event) = with_timeout(self.timeout, async {
            let event = self
                .uow
                .events()
                .find_by_id(input.event_id)
                .await?
                .ok_or_not_found("Event")?;

            if event.has_ended(Utc::now()) {
                return Err(AppError::EventEnded);
            }

            // Separate round-trip from the check above; not atomic
            let ticket = self.uow.tickets().create(owner_id, event.id).await?;
            Ok((ticket, event))
        })
        .await?;

        let png = self.qr.encode(&ticket.qr_payload())?;

        if ticket.event.is_none() {
            ticket.event = Some(event.clone());
        }

        // The PNG exists nowhere else, so this write may not be dropped
        self.jobs
            .submit(
                CacheJob::StoreTicket {
                    ticket: ticket.clone(),
                    qr_code: Some(png),
                    expires_at: event.end_date,
                },
                self.timeout,
            )
            .await?;

        tracing::info!(ticket_id = ticket.id, event_id = event.id, owner_id, "Ticket purchased");

        self.jobs.enqueue(CacheJob::EvictTicketList(owner_id));
        self.jobs.enqueue(CacheJob::EvictEvent(event.id));

        Ok(ticket)
    }

    async fn validate_one(&self, input: ValidateTicket) -> AppResult<Ticket> {
        let ticket = with_timeout(
            self.timeout,
            self.uow
                .tickets()
                .mark_entered(input.ticket_id, input.owner_id),
        )
        .await?;

        tracing::info!(ticket_id = ticket.id, owner_id = ticket.user_id, "Ticket validated");
        self.invalidate(&ticket);
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JobSettings, QrSettings};
    use crate::domain::{Event, RecoveryLevel};
    use crate::infra::{
        MockEventRepository, MockStatisticsRepository, MockTicketRepository, MockUserRepository,
        Persistence,
    };
    use chrono::{DateTime, Duration as ChronoDuration};

    fn event(id: i32, end_date: DateTime<Utc>) -> Event {
        Event {
            id,
            name: "Festival".to_string(),
            location: "Park".to_string(),
            date: end_date - ChronoDuration::hours(4),
            end_date,
            total_tickets_purchased: 0,
            total_tickets_entered: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ticket(id: i32, owner: i32, event: Option<Event>) -> Ticket {
        Ticket {
            id,
            user_id: owner,
            event_id: event.as_ref().map_or(1, |e| e.id),
            event,
            entered: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn manager(
        events: MockEventRepository,
        tickets: MockTicketRepository,
    ) -> (TicketManager<Persistence>, Cache, JobQueue) {
        let uow = Persistence::from_parts(
            Arc::new(MockUserRepository::new()),
            Arc::new(events),
            Arc::new(tickets),
            Arc::new(MockStatisticsRepository::new()),
        );
        let cache = Cache::in_memory();
        let jobs = JobQueue::start(
            cache.clone(),
            JobSettings {
                workers: 2,
                capacity: 32,
                job_timeout: Duration::from_secs(5),
            },
        );
        let qr = QrEncoder::new(QrSettings {
            size: 128,
            level: RecoveryLevel::Medium,
        });
        let service = TicketManager::new(
            Arc::new(uow),
            cache.clone(),
            jobs.clone(),
            qr,
            Duration::from_secs(5),
        );
        (service, cache, jobs)
    }

    #[tokio::test]
    async fn test_purchase_for_ended_event_is_rejected() {
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(|id| Ok(Some(event(id, Utc::now() - ChronoDuration::hours(1)))));
        let mut tickets = MockTicketRepository::new();
        tickets.expect_create().never();

        let (service, _, _) = manager(events, tickets);
        let result = service.create_one(1, CreateTicket { event_id: 4 }).await;

        assert!(matches!(result, Err(AppError::EventEnded)));
    }

    #[tokio::test]
    async fn test_purchase_caches_ticket_and_qr() {
        let end = Utc::now() + ChronoDuration::hours(1);
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(move |id| Ok(Some(event(id, end))));
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_create()
            .returning(|owner, event_id| {
                let mut created = ticket(11, owner, None);
                created.event_id = event_id;
                Ok(created)
            });

        let (service, cache, jobs) = manager(events, tickets);
        let created = service
            .create_one(2, CreateTicket { event_id: 4 })
            .await
            .unwrap();
        assert_eq!(created.event.as_ref().map(|e| e.id), Some(4));

        jobs.wait_idle().await;
        assert!(cache.get_ticket(11, 2).await.unwrap().is_some());
        assert!(cache.get_qr_code(11, 2).await.unwrap().is_some());

        match service.get_one(11, 2).await.unwrap() {
            TicketView::Active(view) => assert!(!view.qrcode.is_empty()),
            TicketView::QrExpired(_) => panic!("QR should still be cached"),
        }
    }

    #[tokio::test]
    async fn test_lapsed_qr_is_reported_expired_not_regenerated() {
        let mut tickets = MockTicketRepository::new();
        let end = Utc::now() + ChronoDuration::hours(1);
        tickets
            .expect_find_for_owner()
            .returning(move |id, owner| Ok(Some(ticket(id, owner, Some(event(4, end))))));

        let (service, cache, jobs) = manager(MockEventRepository::new(), tickets);

        match service.get_one(8, 3).await.unwrap() {
            TicketView::QrExpired(expired) => {
                assert_eq!(expired.ticket.id, 8);
                assert_eq!(expired.message, QR_UNAVAILABLE_MESSAGE);
            }
            TicketView::Active(_) => panic!("QR must not be regenerated"),
        }

        jobs.wait_idle().await;
        assert!(cache.get_qr_code(8, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_qr_of_ended_event_says_event_has_ended() {
        let mut tickets = MockTicketRepository::new();
        let ended = Utc::now() - ChronoDuration::minutes(5);
        tickets
            .expect_find_for_owner()
            .returning(move |id, owner| Ok(Some(ticket(id, owner, Some(event(4, ended))))));

        let (service, _, _) = manager(MockEventRepository::new(), tickets);

        match service.get_one(8, 3).await.unwrap() {
            TicketView::QrExpired(expired) => assert_eq!(expired.message, QR_EXPIRED_MESSAGE),
            TicketView::Active(_) => panic!("QR must not be regenerated"),
        }
    }

    #[tokio::test]
    async fn test_purchase_fails_when_queue_is_shut_down() {
        let end = Utc::now() + ChronoDuration::hours(1);
        let mut events = MockEventRepository::new();
        events
            .expect_find_by_id()
            .returning(move |id| Ok(Some(event(id, end))));
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_create()
            .returning(|owner, event_id| {
                let mut created = ticket(12, owner, None);
                created.event_id = event_id;
                Ok(created)
            });

        let (service, _, jobs) = manager(events, tickets);
        jobs.shutdown().await;

        let result = service.create_one(2, CreateTicket { event_id: 4 }).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_validate_twice_is_harmless() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_mark_entered().times(2).returning(|id, owner| {
            let mut entered = ticket(id, owner, None);
            entered.entered = true;
            Ok(entered)
        });

        let (service, _, _) = manager(MockEventRepository::new(), tickets);
        let body = || ValidateTicket {
            ticket_id: 5,
            owner_id: 6,
        };

        assert!(service.validate_one(body()).await.unwrap().entered);
        assert!(service.validate_one(body()).await.unwrap().entered);
    }

    #[tokio::test]
    async fn test_validate_evicts_cached_entries() {
        let mut tickets = MockTicketRepository::new();
        tickets.expect_mark_entered().returning(|id, owner| {
            let mut entered = ticket(id, owner, None);
            entered.entered = true;
            Ok(entered)
        });

        let (service, cache, jobs) = manager(MockEventRepository::new(), tickets);
        let future = Utc::now() + ChronoDuration::hours(1);
        cache.set_ticket(&ticket(5, 6, None), future).await.unwrap();
        cache.set_ticket_list(6, &[ticket(5, 6, None)]).await.unwrap();

        service
            .validate_one(ValidateTicket {
                ticket_id: 5,
                owner_id: 6,
            })
            .await
            .unwrap();
        jobs.wait_idle().await;

        assert!(cache.get_ticket(5, 6).await.unwrap().is_none());
        assert!(cache.get_ticket_list(6).await.unwrap().is_none());
    }
}
