//! Infrastructure layer - External systems integration
//!
//! - Database connection, migrations and repositories (SeaORM / Postgres)
//! - Cache backends (Redis or in-memory) and typed cache access
//! - Unit of Work aggregating the repositories

pub mod cache;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{Cache, CacheBackend, MemoryCache, RedisCache, Session};
pub use db::{Database, Migrator};
pub use repositories::{
    EventRepository, EventStore, StatisticsRepository, StatisticsStore, TicketRepository,
    TicketStore, UserRepository, UserStore,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheBackend;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockEventRepository, MockStatisticsRepository, MockTicketRepository, MockUserRepository,
};
