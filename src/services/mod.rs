//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on repository traits through the
//! Unit of Work and push cache maintenance onto the job queue.

mod auth_service;
pub mod container;
mod event_service;
mod qr_service;
mod statistics_service;
mod ticket_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthResponse, AuthService, AuthUser, Authenticator, Claims};
pub use event_service::{EventManager, EventService};
pub use qr_service::QrEncoder;
pub use statistics_service::{StatisticsReporter, StatisticsService};
pub use ticket_service::{
    TicketManager, TicketService, QR_EXPIRED_MESSAGE, QR_UNAVAILABLE_MESSAGE,
};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
