//! Authentication handlers.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::AuthResponse;
use crate::types::{ApiResponse, Created};

/// Credentials accepted by both register and login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct Credentials {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Authentication routes that need a resolved caller
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// Register a new attendee account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = Credentials,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation error or email already registered"),
        (status = 422, description = "Malformed JSON body")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<Credentials>,
) -> AppResult<Created<AuthResponse>> {
    let auth = state
        .auth_service
        .register(payload.email, payload.password)
        .await?;

    Ok(Created(auth, "Successfully registered"))
}

/// Login and get a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid credentials"),
        (status = 422, description = "Malformed JSON body")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<Credentials>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let auth = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(ApiResponse::with_message(auth, "Successfully logged in")))
}

/// Drop the caller's cached session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<()>>> {
    state.auth_service.logout(user.id).await?;

    Ok(Json(ApiResponse::message("Successfully logged out")))
}
