//! Bearer authentication middleware.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_SCHEME;
use crate::domain::UserRole;
use crate::errors::AppError;
use crate::services::AuthUser;

/// Authenticated caller, resolved by [`auth_middleware`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub role: UserRole,
}

impl From<AuthUser> for CurrentUser {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// Split `Bearer <token>`; anything but exactly two parts is rejected.
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Authentication middleware.
///
/// Resolves the caller through the auth service (session fast path, then
/// the user store) and injects [`CurrentUser`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized)?;

    let user = state.auth_service.authorize(token).await?;

    request.extensions_mut().insert(CurrentUser::from(user));

    Ok(next.run(request).await)
}

/// Reject callers without the manager role. Must run after [`auth_middleware`].
pub async fn require_manager(
    user: CurrentUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.role.is_manager() {
        tracing::debug!(user_id = user.id, "Manager route refused");
        return Err(AppError::forbidden("Manager role required"));
    }

    Ok(next.run(request).await)
}
