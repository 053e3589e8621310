//! Authentication service - Registration, login and the authorization gate.
//!
//! Tokens are HS256 JWTs carrying the user id and role. A verified token is
//! accepted straight from the session store when the cached session holds the
//! same token; otherwise the user is looked up in the database and the session
//! is (re)written. Session store failures are logged, never surfaced.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::Config;
use crate::domain::{Password, User, UserResponse, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Session, UnitOfWork};
use crate::utils::with_timeout;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token and user returned after register/login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// Identity resolved by the authorization gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub role: UserRole,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new attendee and sign them in
    async fn register(&self, email: String, password: String) -> AppResult<AuthResponse>;

    /// Verify credentials and issue a token
    async fn login(&self, email: String, password: String) -> AppResult<AuthResponse>;

    /// Drop the cached session of a user
    async fn logout(&self, user_id: i32) -> AppResult<()>;

    /// Verify a JWT and extract its claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;

    /// Resolve the identity behind a bearer token
    async fn authorize(&self, token: &str) -> AppResult<AuthUser>;
}

/// Sign a token for a user.
fn generate_token(user: &User, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        id: user.id,
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?)
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Cache,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, cache: Cache, config: Config) -> Self {
        Self { uow, cache, config }
    }

    fn respond(&self, user: User) -> AppResult<AuthResponse> {
        let token = generate_token(&user, &self.config)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Cached session for the user if it was issued for this exact token.
    async fn cached_identity(&self, user_id: i32, token: &str) -> Option<AuthUser> {
        match with_timeout(self.config.request_timeout, self.cache.get_session(user_id)).await {
            Ok(Some(session)) if session.token == token => Some(AuthUser {
                id: user_id,
                role: session.role,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Session lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, email: String, password: String) -> AppResult<AuthResponse> {
        // Email format is validated by the handler's ValidatedJson extractor
        let user = with_timeout(self.config.request_timeout, async {
            if self.uow.users().find_by_email(&email).await?.is_some() {
                return Err(AppError::conflict("User"));
            }

            let password_hash = Password::new(&password)?.into_string();
            self.uow.users().create(email, password_hash).await
        })
        .await?;

        tracing::info!(user_id = user.id, "User registered");
        self.respond(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<AuthResponse> {
        let user_result = with_timeout(
            self.config.request_timeout,
            self.uow.users().find_by_email(&email),
        )
        .await?;

        match user_result {
            Some(user) if Password::from_hash(user.password_hash.as_str()).verify(&password) => {
                self.respond(user)
            }
            Some(_) => Err(AppError::InvalidCredentials),
            None => {
                // Unknown emails cost one hash so timing does not reveal them
                Password::burn(&password);
                Err(AppError::InvalidCredentials)
            }
        }
    }

    async fn logout(&self, user_id: i32) -> AppResult<()> {
        with_timeout(
            self.config.request_timeout,
            self.cache.delete_session(user_id),
        )
        .await?;
        tracing::info!(user_id, "User logged out");
        Ok(())
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }

    async fn authorize(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.verify_token(token)?;

        if let Some(identity) = self.cached_identity(claims.id, token).await {
            return Ok(identity);
        }

        let user = with_timeout(
            self.config.request_timeout,
            self.uow.users().find_by_id(claims.id),
        )
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = claims.id, "Token for unknown user");
            AppError::Unauthorized
        })?;

        let session = Session {
            token: token.to_string(),
            role: user.role,
        };
        let stored = with_timeout(
            self.config.request_timeout,
            self.cache.store_session(user.id, &session),
        )
        .await;
        if let Err(e) = stored {
            tracing::warn!(user_id = user.id, error = %e, "Failed to store session");
        }

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        MockCacheBackend, MockEventRepository, MockStatisticsRepository, MockTicketRepository,
        MockUserRepository, Persistence,
    };

    const SECRET: &str = "unit-test-secret-that-is-32-chars!";

    fn user(id: i32, role: UserRole, password: &str) -> User {
        User {
            id,
            email: format!("user{}@example.com", id),
            password_hash: Password::new(password).unwrap().into_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn authenticator(users: MockUserRepository, cache: Cache) -> Authenticator<Persistence> {
        let uow = Persistence::from_parts(
            Arc::new(users),
            Arc::new(MockEventRepository::new()),
            Arc::new(MockTicketRepository::new()),
            Arc::new(MockStatisticsRepository::new()),
        );
        Authenticator::new(Arc::new(uow), cache, Config::with_secret(SECRET))
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(1, UserRole::Attendee, "password123"))));
        users.expect_create().never();

        let auth = authenticator(users, Cache::in_memory());
        let result = auth
            .register("user1@example.com".to_string(), "password123".to_string())
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_issues_token_with_id_and_role() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(5, UserRole::Manager, "password123"))));

        let auth = authenticator(users, Cache::in_memory());
        let response = auth
            .login("user5@example.com".to_string(), "password123".to_string())
            .await
            .unwrap();

        let claims = auth.verify_token(&response.token).unwrap();
        assert_eq!(claims.id, 5);
        assert_eq!(claims.role, "manager");
        assert_eq!(response.user.id, 5);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(5, UserRole::Attendee, "password123"))));

        let auth = authenticator(users, Cache::in_memory());
        let result = auth
            .login("user5@example.com".to_string(), "wrong-password".to_string())
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authorize_uses_cached_session_without_store() {
        let cache = Cache::in_memory();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();
        let auth = authenticator(users, cache.clone());

        let token = generate_token(
            &user(9, UserRole::Attendee, "password123"),
            &Config::with_secret(SECRET),
        )
        .unwrap();
        cache
            .store_session(
                9,
                &Session {
                    token: token.clone(),
                    role: UserRole::Manager,
                },
            )
            .await
            .unwrap();

        let identity = auth.authorize(&token).await.unwrap();
        assert_eq!(identity.id, 9);
        // Fast path trusts the session's role
        assert_eq!(identity.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn test_authorize_falls_back_to_store_and_writes_session() {
        let cache = Cache::in_memory();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .returning(|id| Ok(Some(user(id, UserRole::Attendee, "password123"))));
        let auth = authenticator(users, cache.clone());

        let token = generate_token(
            &user(3, UserRole::Attendee, "password123"),
            &Config::with_secret(SECRET),
        )
        .unwrap();

        let identity = auth.authorize(&token).await.unwrap();
        assert_eq!(identity.role, UserRole::Attendee);

        let session = cache.get_session(3).await.unwrap().unwrap();
        assert_eq!(session.token, token);

        // Second call is served from the session
        auth.authorize(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_authorize_unknown_user_is_unauthorized() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let auth = authenticator(users, Cache::in_memory());

        let token = generate_token(
            &user(42, UserRole::Attendee, "password123"),
            &Config::with_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            auth.authorize(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_session_failures_do_not_block_authorization() {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_hash_get_all()
            .returning(|_| Err(AppError::cache("down")));
        backend
            .expect_hash_set()
            .returning(|_, _| Err(AppError::cache("down")));
        backend.expect_expire().returning(|_, _| Ok(()));

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id, UserRole::Attendee, "password123"))));
        let auth = authenticator(users, Cache::new(Arc::new(backend)));

        let token = generate_token(
            &user(4, UserRole::Attendee, "password123"),
            &Config::with_secret(SECRET),
        )
        .unwrap();

        assert_eq!(auth.authorize(&token).await.unwrap().id, 4);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let auth = authenticator(MockUserRepository::new(), Cache::in_memory());
        let token = generate_token(
            &user(1, UserRole::Attendee, "password123"),
            &Config::with_secret(SECRET),
        )
        .unwrap();

        let other = Config::with_secret("another-secret-that-is-32-chars-long");
        assert!(verify_token_internal(&token, &other).is_err());
        assert!(auth.verify_token("not.a.jwt").is_err());
    }
}
