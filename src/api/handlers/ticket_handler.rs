//! Ticket handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};

use crate::api::extractors::{ValidatedJson, ValidatedPath};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{CreateTicket, ExpiredQr, Ticket, TicketView, TicketWithQr, ValidateTicket};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created};

/// Message returned when a ticket's QR artifact has lapsed from the cache
pub const QR_EXPIRED: &str = "QR code expired";

/// Create ticket routes
pub fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/validate", post(validate_ticket))
        .route("/:ticket_id", get(get_ticket))
}

/// List the caller's tickets
#[utoipa::path(
    get,
    path = "/api/ticket",
    tag = "Tickets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's tickets", body = [Ticket]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Ticket>>>> {
    let tickets = state.ticket_service.get_many(user.id).await?;
    Ok(Json(ApiResponse::success(tickets)))
}

/// Get one of the caller's tickets with its QR code
#[utoipa::path(
    get,
    path = "/api/ticket/{ticketId}",
    tag = "Tickets",
    security(("bearer_auth" = [])),
    params(("ticketId" = i32, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket with base64 PNG QR code", body = TicketWithQr),
        (status = 400, description = "Ticket not found, or QR code expired", body = ExpiredQr),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<Response> {
    let response = match state.ticket_service.get_one(id, user.id).await? {
        TicketView::Active(view) => Json(ApiResponse::success(view)).into_response(),
        TicketView::QrExpired(expired) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail_with_data(QR_EXPIRED, expired)),
        )
            .into_response(),
    };

    Ok(response)
}

/// Purchase a ticket for an event that has not ended
#[utoipa::path(
    post,
    path = "/api/ticket",
    tag = "Tickets",
    security(("bearer_auth" = [])),
    request_body = CreateTicket,
    responses(
        (status = 201, description = "Ticket created", body = Ticket),
        (status = 400, description = "Event not found or already ended"),
        (status = 422, description = "Malformed JSON body")
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateTicket>,
) -> AppResult<Created<Ticket>> {
    let ticket = state.ticket_service.create_one(user.id, payload).await?;
    Ok(Created(ticket, "Ticket created successfully"))
}

/// Mark a ticket as entered at the gate
#[utoipa::path(
    post,
    path = "/api/ticket/validate",
    tag = "Tickets",
    security(("bearer_auth" = [])),
    request_body = ValidateTicket,
    responses(
        (status = 200, description = "Ticket validated", body = Ticket),
        (status = 400, description = "Ticket not found"),
        (status = 422, description = "Malformed JSON body")
    )
)]
pub async fn validate_ticket(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ValidateTicket>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    let ticket = state.ticket_service.validate_one(payload).await?;
    Ok(Json(ApiResponse::with_message(ticket, "Welcome to the show")))
}
