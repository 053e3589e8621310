//! Session store: `user:{id}:session` hashes holding the active token.

use std::time::Duration;

use super::{keys, Cache};
use crate::config::SESSION_TTL_SECONDS;
use crate::domain::UserRole;
use crate::errors::AppResult;

const FIELD_TOKEN: &str = "token";
const FIELD_ROLE: &str = "role";

/// Cached identity for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: UserRole,
}

impl Cache {
    /// Load a session; incomplete hashes are treated as absent.
    pub async fn get_session(&self, user_id: i32) -> AppResult<Option<Session>> {
        let mut fields = self.backend.hash_get_all(&keys::session(user_id)).await?;

        let (Some(token), Some(role)) = (fields.remove(FIELD_TOKEN), fields.remove(FIELD_ROLE))
        else {
            return Ok(None);
        };

        Ok(Some(Session {
            token,
            role: UserRole::from(role.as_str()),
        }))
    }

    /// Store a session and (re)start its 24 hour expiration.
    pub async fn store_session(&self, user_id: i32, session: &Session) -> AppResult<()> {
        let key = keys::session(user_id);
        self.backend
            .hash_set(
                &key,
                vec![
                    (FIELD_TOKEN.to_string(), session.token.clone()),
                    (FIELD_ROLE.to_string(), session.role.to_string()),
                ],
            )
            .await?;
        self.backend
            .expire(&key, Duration::from_secs(SESSION_TTL_SECONDS))
            .await
    }

    pub async fn delete_session(&self, user_id: i32) -> AppResult<()> {
        self.delete(&keys::session(user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_round_trip() {
        let cache = Cache::in_memory();
        let session = Session {
            token: "jwt".to_string(),
            role: UserRole::Manager,
        };

        cache.store_session(3, &session).await.unwrap();
        assert_eq!(cache.get_session(3).await.unwrap(), Some(session));

        cache.delete_session(3).await.unwrap();
        assert_eq!(cache.get_session(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partial_hash_is_absent() {
        let cache = Cache::in_memory();
        cache
            .backend()
            .hash_set("user:4:session", vec![("token".to_string(), "t".to_string())])
            .await
            .unwrap();

        assert_eq!(cache.get_session(4).await.unwrap(), None);
    }
}
