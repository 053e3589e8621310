//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database};
use crate::jobs::JobQueue;
use crate::services::{
    AuthService, EventService, ServiceContainer, Services, StatisticsService, TicketService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub event_service: Arc<dyn EventService>,
    pub ticket_service: Arc<dyn TicketService>,
    pub statistics_service: Arc<dyn StatisticsService>,
    pub cache: Cache,
    /// Cache job queue, exposed for health reporting
    pub jobs: JobQueue,
    /// Database handle for health checks; absent when services run on fakes
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// Create application state backed by the database.
    pub fn from_config(
        database: Arc<Database>,
        cache: Cache,
        jobs: JobQueue,
        config: &Config,
    ) -> Self {
        let services = Services::from_connection(
            database.connection().clone(),
            cache.clone(),
            jobs.clone(),
            config,
        );

        let mut state = Self::from_services(&services, cache, jobs);
        state.database = Some(database);
        state
    }

    /// Create application state from an already wired container.
    pub fn from_services(services: &impl ServiceContainer, cache: Cache, jobs: JobQueue) -> Self {
        Self {
            auth_service: services.auth(),
            event_service: services.events(),
            ticket_service: services.tickets(),
            statistics_service: services.statistics(),
            cache,
            jobs,
            database: None,
        }
    }
}
