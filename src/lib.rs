//! Ticket booking API
//!
//! REST backend for selling event tickets: users register and log in,
//! create events, buy tickets that carry a QR code, and have them
//! validated at the gate. A manager-only dashboard reports totals.
//!
//! # Architecture Layers
//!
//! - **cli** / **commands**: command-line entry points (`serve`, `migrate`)
//! - **config**: environment configuration and constants
//! - **domain**: entities and request payloads
//! - **services**: use cases (auth, events, tickets, statistics)
//! - **infra**: database, repositories and the cache
//! - **jobs**: background cache population queue
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: response envelope
//! - **errors**: centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! ticket-booking migrate up
//! ticket-booking serve --port 3000
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use api::{create_router, AppState};
pub use config::Config;
pub use domain::{Event, Ticket, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
pub use jobs::JobQueue;
