//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::constants::{
    DEFAULT_CACHE_JOB_CAPACITY, DEFAULT_CACHE_JOB_TIMEOUT_SECS, DEFAULT_CACHE_JOB_WORKERS,
    DEFAULT_DATABASE_URL, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_QR_LEVEL, DEFAULT_QR_SIZE,
    DEFAULT_REDIS_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    MIN_JWT_SECRET_LENGTH,
};
use crate::domain::RecoveryLevel;

/// Which cache backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

/// QR rendering settings
#[derive(Debug, Clone, Copy)]
pub struct QrSettings {
    /// Edge length of the rendered image in pixels
    pub size: u32,
    pub level: RecoveryLevel,
}

/// Cache job queue settings
#[derive(Debug, Clone, Copy)]
pub struct JobSettings {
    pub workers: usize,
    pub capacity: usize,
    pub job_timeout: Duration,
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub cache_backend: CacheBackendKind,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub request_timeout: Duration,
    pub qr: QrSettings,
    pub jobs: JobSettings,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("cache_backend", &self.cache_backend)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("request_timeout", &self.request_timeout)
            .field("qr", &self.qr)
            .field("jobs", &self.jobs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let qr_level = env::var("QR_LEVEL").unwrap_or_else(|_| DEFAULT_QR_LEVEL.to_string());

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            cache_backend: parse_or("CACHE_BACKEND", CacheBackendKind::Redis),
            jwt_secret,
            jwt_expiration_hours: parse_or("JWT_EXPIRATION_HOURS", DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            qr: QrSettings {
                size: parse_or("QR_SIZE", DEFAULT_QR_SIZE),
                level: RecoveryLevel::from_name(&qr_level),
            },
            jobs: JobSettings {
                workers: parse_or("CACHE_JOB_WORKERS", DEFAULT_CACHE_JOB_WORKERS).max(1),
                capacity: parse_or("CACHE_JOB_CAPACITY", DEFAULT_CACHE_JOB_CAPACITY).max(1),
                job_timeout: Duration::from_secs(parse_or(
                    "CACHE_JOB_TIMEOUT_SECS",
                    DEFAULT_CACHE_JOB_TIMEOUT_SECS,
                )),
            },
        }
    }

    /// Build a configuration with defaults and an explicit secret.
    ///
    /// Used by tests and embedded setups that do not read the environment.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache_backend: CacheBackendKind::Memory,
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            qr: QrSettings {
                size: DEFAULT_QR_SIZE,
                level: RecoveryLevel::Medium,
            },
            jobs: JobSettings {
                workers: DEFAULT_CACHE_JOB_WORKERS,
                capacity: DEFAULT_CACHE_JOB_CAPACITY,
                job_timeout: Duration::from_secs(DEFAULT_CACHE_JOB_TIMEOUT_SECS),
            },
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Read and parse an environment variable, falling back to a default.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key = key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_backend_parse() {
        assert_eq!("redis".parse::<CacheBackendKind>(), Ok(CacheBackendKind::Redis));
        assert_eq!("Memory".parse::<CacheBackendKind>(), Ok(CacheBackendKind::Memory));
        assert!("memcached".parse::<CacheBackendKind>().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::with_secret("super-secret-value-that-is-long-enough");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn test_server_addr() {
        let config = Config::with_secret("x".repeat(32));
        assert_eq!(config.server_addr(), "0.0.0.0:3000");
    }
}
