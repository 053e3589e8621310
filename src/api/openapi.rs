//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, event_handler, statistics_handler, ticket_handler};
use crate::domain::{
    CreateEvent, CreateTicket, Event, ExpiredQr, Statistics, Ticket, TicketWithQr, UpdateEvent,
    UserResponse, UserRole, ValidateTicket,
};
use crate::services::AuthResponse;

/// OpenAPI documentation for the ticket booking API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ticket Booking API",
        version = "0.1.0",
        description = "Events, QR-coded tickets and gate validation",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        auth_handler::logout,
        event_handler::list_events,
        event_handler::get_event,
        event_handler::create_event,
        event_handler::update_event,
        event_handler::delete_event,
        ticket_handler::list_tickets,
        ticket_handler::get_ticket,
        ticket_handler::create_ticket,
        ticket_handler::validate_ticket,
        statistics_handler::dashboard,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            auth_handler::Credentials,
            AuthResponse,
            Event,
            CreateEvent,
            UpdateEvent,
            Ticket,
            TicketWithQr,
            ExpiredQr,
            CreateTicket,
            ValidateTicket,
            Statistics,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and logout"),
        (name = "Events", description = "Event management"),
        (name = "Tickets", description = "Ticket purchase, QR codes and gate validation"),
        (name = "Statistics", description = "Manager dashboard")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
