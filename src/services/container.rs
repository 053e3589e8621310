//! Service Container - Centralized service access.
//!
//! Builds every service over one Unit of Work, cache and job queue, and
//! hands them out as trait objects.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, EventManager, EventService, QrEncoder, StatisticsReporter,
    StatisticsService, TicketManager, TicketService,
};
use crate::config::Config;
use crate::infra::{Cache, Persistence, UnitOfWork};
use crate::jobs::JobQueue;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn events(&self) -> Arc<dyn EventService>;

    fn tickets(&self) -> Arc<dyn TicketService>;

    fn statistics(&self) -> Arc<dyn StatisticsService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    event_service: Arc<dyn EventService>,
    ticket_service: Arc<dyn TicketService>,
    statistics_service: Arc<dyn StatisticsService>,
}

impl Services {
    /// Wire services over any Unit of Work implementation.
    pub fn build<U: UnitOfWork + 'static>(
        uow: Arc<U>,
        cache: Cache,
        jobs: JobQueue,
        config: &Config,
    ) -> Self {
        let timeout = config.request_timeout;
        let qr = QrEncoder::new(config.qr);

        Self {
            auth_service: Arc::new(Authenticator::new(
                uow.clone(),
                cache.clone(),
                config.clone(),
            )),
            event_service: Arc::new(EventManager::new(
                uow.clone(),
                cache.clone(),
                jobs.clone(),
                timeout,
            )),
            ticket_service: Arc::new(TicketManager::new(uow.clone(), cache, jobs, qr, timeout)),
            statistics_service: Arc::new(StatisticsReporter::new(uow, timeout)),
        }
    }

    /// Create service container from a database connection.
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        cache: Cache,
        jobs: JobQueue,
        config: &Config,
    ) -> Self {
        Self::build(Arc::new(Persistence::new(db)), cache, jobs, config)
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn events(&self) -> Arc<dyn EventService> {
        self.event_service.clone()
    }

    fn tickets(&self) -> Arc<dyn TicketService> {
        self.ticket_service.clone()
    }

    fn statistics(&self) -> Arc<dyn StatisticsService> {
        self.statistics_service.clone()
    }
}
