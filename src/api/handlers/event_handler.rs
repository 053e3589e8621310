//! Event handlers.

use axum::{extract::State, response::Json, routing::get, Router};

use crate::api::extractors::{ValidatedJson, ValidatedPath};
use crate::api::AppState;
use crate::domain::{CreateEvent, Event, UpdateEvent};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created, NoContent};

/// Create event routes
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route(
            "/:event_id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

/// List all events, most recently updated first
#[utoipa::path(
    get,
    path = "/api/event",
    tag = "Events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of events", body = [Event]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_events(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Event>>>> {
    let events = state.event_service.get_many().await?;
    Ok(Json(ApiResponse::success(events)))
}

/// Get a single event
#[utoipa::path(
    get,
    path = "/api/event/{eventId}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("eventId" = i32, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 400, description = "Event not found or invalid id"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<Json<ApiResponse<Event>>> {
    let event = state.event_service.get_one(id).await?;
    Ok(Json(ApiResponse::success(event)))
}

/// Create an event
#[utoipa::path(
    post,
    path = "/api/event",
    tag = "Events",
    security(("bearer_auth" = [])),
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Validation error"),
        (status = 422, description = "Malformed JSON body")
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateEvent>,
) -> AppResult<Created<Event>> {
    let event = state.event_service.create_one(payload).await?;
    Ok(Created(event, "Event created successfully"))
}

/// Update any subset of an event's fields
#[utoipa::path(
    put,
    path = "/api/event/{eventId}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("eventId" = i32, Path, description = "Event id")),
    request_body = UpdateEvent,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, description = "Validation error or event not found"),
        (status = 422, description = "Malformed JSON body")
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateEvent>,
) -> AppResult<Json<ApiResponse<Event>>> {
    let event = state.event_service.update_one(id, payload).await?;
    Ok(Json(ApiResponse::with_message(event, "Event updated successfully")))
}

/// Delete an event and its tickets
#[utoipa::path(
    delete,
    path = "/api/event/{eventId}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("eventId" = i32, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 400, description = "Event not found or invalid id")
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<i32>,
) -> AppResult<NoContent> {
    state.event_service.delete_one(id).await?;
    Ok(NoContent)
}
