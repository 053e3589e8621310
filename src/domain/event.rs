//! Event domain entity and request payloads.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::config::EVENT_CACHE_FALLBACK_TTL_SECONDS;

/// Event with its derived ticket counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "RustConf")]
    pub name: String,
    #[schema(example = "Montreal")]
    pub location: String,
    /// Start of the event
    pub date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_tickets_purchased: i64,
    pub total_tickets_entered: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// True once the end date has passed.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }

    /// Lifetime of cache entries tied to this event.
    ///
    /// Entries live until the event ends; events that already ended get a
    /// short fallback so list reads still benefit from the cache.
    pub fn cache_ttl(&self, now: DateTime<Utc>) -> Duration {
        (self.end_date - now)
            .to_std()
            .ok()
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(Duration::from_secs(EVENT_CACHE_FALLBACK_TTL_SECONDS))
    }
}

/// Create event request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_window"))]
pub struct CreateEvent {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    pub date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Update event request; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Location cannot be empty"))]
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl UpdateEvent {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.date.is_none()
            && self.end_date.is_none()
    }

    /// Resulting (start, end) window once applied on top of `current`.
    pub fn merged_window(&self, current: &Event) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.date.unwrap_or(current.date),
            self.end_date.unwrap_or(current.end_date),
        )
    }
}

fn validate_create_window(event: &CreateEvent) -> Result<(), ValidationError> {
    check_window(event.date, event.end_date)
}

/// An event may not end before it starts.
pub fn check_window(date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<(), ValidationError> {
    if end_date < date {
        let mut error = ValidationError::new("end_before_start");
        error.message = Some("End date must not be before the start date".into());
        return Err(error);
    }
    Ok(())
}
