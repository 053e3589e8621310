//! Application route configuration.

use axum::{extract::State, http::StatusCode, middleware, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    auth_routes, event_routes, session_routes, statistics_routes, ticket_routes,
};
use super::middleware::{auth_middleware, require_manager};
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::API_PREFIX;
use crate::jobs::JobStats;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let authenticated = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth = auth_routes().merge(session_routes().route_layer(authenticated()));

    let protected = Router::new()
        .nest("/event", event_routes())
        .nest("/ticket", ticket_routes())
        .nest(
            "/statistics",
            statistics_routes().route_layer(middleware::from_fn(require_manager)),
        )
        .route_layer(authenticated());

    let api = Router::new().nest("/auth", auth).merge(protected);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(API_PREFIX, api)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Welcome to the ticket booking API"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
    jobs: JobStats,
}

/// Individual service health status
#[derive(Serialize)]
struct ServiceHealth {
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<ServiceStatus>,
    cache: ServiceStatus,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy",
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Health check endpoint with database and cache connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        Some(db) => Some(ServiceStatus::from_result(db.ping().await)),
        None => None,
    };
    let cache = ServiceStatus::from_result(state.cache.ping().await);

    let all_healthy = cache.is_healthy() && database.as_ref().map_or(true, |s| s.is_healthy());

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" },
        services: ServiceHealth { database, cache },
        jobs: state.jobs.stats(),
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
