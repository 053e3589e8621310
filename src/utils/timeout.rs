//! Deadline for work done on behalf of a request.

use std::future::Future;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Run `future` under `limit`, turning an elapsed deadline into
/// [`AppError::Timeout`].
pub async fn with_timeout<F, T>(limit: Duration, future: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(limit_ms = limit.as_millis() as u64, "Request work timed out");
            Err(AppError::Timeout)
        }
    }
}
