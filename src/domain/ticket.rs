//! Ticket domain entity and request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::event::Event;

/// A purchased ticket, with its parent event preloaded on reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[schema(example = 1)]
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    /// Set once the ticket has been scanned at the gate
    pub entered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Text encoded into the ticket's QR code.
    pub fn qr_payload(&self) -> String {
        qr_payload(self.id, self.user_id)
    }
}

pub fn qr_payload(ticket_id: i32, owner_id: i32) -> String {
    format!("ticketId:{},ownerId:{}", ticket_id, owner_id)
}

/// Purchase request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    #[validate(range(min = 1, message = "eventId must be a positive id"))]
    pub event_id: i32,
}

/// Gate validation request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTicket {
    #[validate(range(min = 1, message = "ticketId must be a positive id"))]
    pub ticket_id: i32,
    #[validate(range(min = 1, message = "ownerId must be a positive id"))]
    pub owner_id: i32,
}

/// Ticket together with its QR image (base64-encoded PNG)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketWithQr {
    pub ticket: Ticket,
    pub qrcode: String,
}

/// Payload returned when the QR artifact is no longer cached
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredQr {
    pub ticket: Ticket,
    pub message: String,
}

/// Outcome of a ticket read: the QR is either still cached or lapsed.
#[derive(Debug, Clone)]
pub enum TicketView {
    Active(TicketWithQr),
    QrExpired(ExpiredQr),
}
