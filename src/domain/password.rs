//! Password value object - Argon2 hashes for user accounts.
//!
//! Only the PHC string is ever held; plain text passes through `new`,
//! `verify` and `burn` without being stored.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// A PHC-formatted Argon2 hash as stored in `users.password`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

// Don't expose the hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl Password {
    /// Hash a new password with a fresh random salt.
    ///
    /// # Arguments
    /// * `plain_text` - The raw password (at least `MIN_PASSWORD_LENGTH` bytes)
    ///
    /// # Errors
    /// Returns a validation error if the password is too short, or an
    /// internal error if hashing fails.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        // Validate password length
        if plain_text.len() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;

        Ok(Self(hash.to_string()))
    }

    /// Wrap a hash loaded from the database.
    ///
    /// # Arguments
    /// * `hash` - The stored PHC string; it is not validated here
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Check a login attempt against this hash.
    ///
    /// # Arguments
    /// * `plain_text` - The password supplied at login
    ///
    /// # Returns
    /// `true` only on a match. A malformed stored hash never matches.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }

    /// Spend one hash computation on a login attempt for an unknown email,
    /// so it takes as long as a real verification.
    ///
    /// # Arguments
    /// * `plain_text` - The password supplied at login; the result is discarded
    pub fn burn(plain_text: &str) {
        let salt = SaltString::generate(&mut OsRng);
        let _ = Argon2::default().hash_password(plain_text.as_bytes(), &salt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let password = Password::new("gate-keeper-2024").unwrap();

        assert!(password.verify("gate-keeper-2024"));
        assert!(!password.verify("gate-keeper-2025"));
    }

    #[test]
    fn test_stored_hash_round_trips_through_string() {
        let stored = Password::new("front-row-seat").unwrap().into_string();
        assert!(stored.starts_with("$argon2"));
        assert!(Password::from_hash(stored).verify("front-row-seat"));
    }

    #[test]
    fn test_salts_differ() {
        let a = Password::new("same-password").unwrap();
        let b = Password::new("same-password").unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_minimum_length() {
        assert!(Password::new("12345678").is_ok());
        assert!(matches!(
            Password::new("1234567"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!Password::from_hash("not-a-phc-string").verify("anything"));
    }

    #[test]
    fn test_debug_hides_hash() {
        let password = Password::new("balcony-seats").unwrap();
        assert_eq!(format!("{:?}", password), "Password([REDACTED])");
    }
}
