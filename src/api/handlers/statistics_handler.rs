//! Statistics dashboard handler.

use axum::{extract::State, response::Json, routing::get, Router};

use crate::api::AppState;
use crate::domain::Statistics;
use crate::errors::AppResult;
use crate::types::ApiResponse;

/// Manager-only statistics routes
pub fn statistics_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

/// Event, ticket and entry counts
#[utoipa::path(
    get,
    path = "/api/statistics/dashboard",
    tag = "Statistics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counts", body = Statistics),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager role required")
    )
)]
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Statistics>>> {
    let counts = state.statistics_service.get_counts().await?;
    Ok(Json(ApiResponse::success(counts)))
}
