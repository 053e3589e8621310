//! HTTP request handlers.

pub mod auth_handler;
pub mod event_handler;
pub mod statistics_handler;
pub mod ticket_handler;

pub use auth_handler::{auth_routes, session_routes};
pub use event_handler::event_routes;
pub use statistics_handler::statistics_routes;
pub use ticket_handler::ticket_routes;
