//! Dashboard statistics.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Snapshot of store-wide counts; each count is read independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub event_count: u64,
    pub ticket_count: u64,
    /// Tickets already scanned at the gate
    pub validation_count: u64,
}
