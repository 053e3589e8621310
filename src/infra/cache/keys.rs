//! Cache key layout.

use crate::config::{
    CACHE_PREFIX_EVENT, CACHE_PREFIX_QR, CACHE_PREFIX_TICKET, CACHE_PREFIX_TICKET_LIST,
    CACHE_PREFIX_USER,
};

pub fn event(event_id: i32) -> String {
    format!("{}{}", CACHE_PREFIX_EVENT, event_id)
}

/// Pattern matching every cached event.
pub fn all_events() -> String {
    format!("{}*", CACHE_PREFIX_EVENT)
}

pub fn ticket(ticket_id: i32, owner_id: i32) -> String {
    format!("{}{}:owner:{}", CACHE_PREFIX_TICKET, ticket_id, owner_id)
}

pub fn qr_code(ticket_id: i32, owner_id: i32) -> String {
    format!("{}{}", CACHE_PREFIX_QR, ticket(ticket_id, owner_id))
}

pub fn ticket_list(owner_id: i32) -> String {
    format!("{}{}", CACHE_PREFIX_TICKET_LIST, owner_id)
}

pub fn session(user_id: i32) -> String {
    format!("{}{}:session", CACHE_PREFIX_USER, user_id)
}
