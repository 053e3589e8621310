//! Unit of Work: a single handle to every repository.
//!
//! Repository calls are independent round-trips; no operation here spans
//! several entities atomically.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::repositories::{
    EventRepository, EventStore, StatisticsRepository, StatisticsStore, TicketRepository,
    TicketStore, UserRepository, UserStore,
};

/// Unit of Work trait for dependency injection.
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn events(&self) -> Arc<dyn EventRepository>;

    fn tickets(&self) -> Arc<dyn TicketRepository>;

    fn statistics(&self) -> Arc<dyn StatisticsRepository>;
}

/// Concrete implementation of UnitOfWork
#[derive(Clone)]
pub struct Persistence {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventRepository>,
    tickets: Arc<dyn TicketRepository>,
    statistics: Arc<dyn StatisticsRepository>,
}

impl Persistence {
    /// SeaORM-backed repositories sharing one connection pool
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            events: Arc::new(EventStore::new(db.clone())),
            tickets: Arc::new(TicketStore::new(db.clone())),
            statistics: Arc::new(StatisticsStore::new(db)),
        }
    }

    /// Assemble from arbitrary repository implementations (fakes, mocks).
    pub fn from_parts(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRepository>,
        tickets: Arc<dyn TicketRepository>,
        statistics: Arc<dyn StatisticsRepository>,
    ) -> Self {
        Self {
            users,
            events,
            tickets,
            statistics,
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        self.events.clone()
    }

    fn tickets(&self) -> Arc<dyn TicketRepository> {
        self.tickets.clone()
    }

    fn statistics(&self) -> Arc<dyn StatisticsRepository> {
        self.statistics.clone()
    }
}
