//! Repository layer - Data access abstraction
//!
//! Each repository is a trait with one SeaORM implementation, so services
//! can be tested against mocks or in-memory fakes.

pub(crate) mod entities;
mod event_repository;
mod statistics_repository;
mod ticket_repository;
mod user_repository;

pub use event_repository::{EventRepository, EventStore};
pub use statistics_repository::{StatisticsRepository, StatisticsStore};
pub use ticket_repository::{TicketRepository, TicketStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use event_repository::MockEventRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use statistics_repository::MockStatisticsRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use ticket_repository::MockTicketRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
