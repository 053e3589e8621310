//! Domain layer - Core business entities and logic
//!
//! Models here are independent of storage and transport concerns.

pub mod event;
pub mod password;
pub mod qr;
pub mod statistics;
pub mod ticket;
pub mod user;

pub use event::{CreateEvent, Event, UpdateEvent};
pub use password::Password;
pub use qr::RecoveryLevel;
pub use statistics::Statistics;
pub use ticket::{CreateTicket, ExpiredQr, Ticket, TicketView, TicketWithQr, ValidateTicket};
pub use user::{User, UserResponse, UserRole};
