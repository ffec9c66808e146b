//! Stateless event collection utilities and lenient identifier helpers.
//!
//! The filter/sort/dedup functions are pure and allocation-light; the
//! identifier helpers are best-effort: on codec failure they log a warning
//! and return the input unchanged, so callers must verify before trusting.

use tracing::warn;

use crate::entity::{self, Entity, EventPointer};
use crate::event::Event;

/// Remove duplicate events by id, first occurrence wins, input order
/// preserved. Applying it twice is a no-op.
pub fn deduplicate_events(events: &[Event]) -> Vec<Event> {
    let mut seen = std::collections::HashSet::new();
    events
        .iter()
        .filter(|event| seen.insert(event.id.clone()))
        .cloned()
        .collect()
}

/// Sort events newest-first by `created_at`. The sort is stable: events with
/// equal timestamps keep their relative input order.
pub fn sort_events_by_time(events: &[Event]) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

/// Keep only events whose kind appears in `kinds`.
pub fn filter_events_by_kind(events: &[Event], kinds: &[u16]) -> Vec<Event> {
    events
        .iter()
        .filter(|event| kinds.contains(&event.kind))
        .cloned()
        .collect()
}

/// Keep only events authored by one of `authors`.
pub fn filter_events_by_author(events: &[Event], authors: &[String]) -> Vec<Event> {
    events
        .iter()
        .filter(|event| authors.contains(&event.pubkey))
        .cloned()
        .collect()
}

/// Keep only events inside the inclusive `[since, until]` window; `None`
/// bounds are open. Given both bounds, they are AND-combined.
pub fn filter_events_by_time_range(
    events: &[Event],
    since: Option<u64>,
    until: Option<u64>,
) -> Vec<Event> {
    events
        .iter()
        .filter(|event| {
            if let Some(since) = since
                && event.created_at < since
            {
                return false;
            }
            if let Some(until) = until
                && event.created_at > until
            {
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

/// Check a hex string, optionally against an expected length.
pub fn is_valid_hex(s: &str, expected_len: Option<usize>) -> bool {
    if s.is_empty() {
        return false;
    }
    if let Some(len) = expected_len
        && s.len() != len
    {
        return false;
    }
    s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Encode a hex pubkey as npub, best effort.
pub fn pubkey_to_npub(pubkey: &str) -> String {
    match entity::encode_npub(pubkey) {
        Ok(npub) => npub,
        Err(e) => {
            warn!("failed to encode pubkey as npub: {}", e);
            pubkey.to_string()
        }
    }
}

/// Decode an npub to a hex pubkey, best effort.
pub fn npub_to_pubkey(npub: &str) -> String {
    match entity::decode(npub) {
        Ok(Entity::Npub(pubkey)) => pubkey,
        Ok(_) => {
            warn!("expected npub, got a different entity: {}", npub);
            npub.to_string()
        }
        Err(e) => {
            warn!("failed to decode npub: {}", e);
            npub.to_string()
        }
    }
}

/// Encode an event id (with optional relay hints) as nevent, best effort.
pub fn event_id_to_nevent(event_id: &str, relays: &[String]) -> String {
    let pointer = EventPointer {
        id: event_id.to_string(),
        relays: relays.to_vec(),
    };
    match entity::encode_nevent(&pointer) {
        Ok(nevent) => nevent,
        Err(e) => {
            warn!("failed to encode event id as nevent: {}", e);
            event_id.to_string()
        }
    }
}

/// Decode an nevent to a hex event id, best effort.
pub fn nevent_to_event_id(nevent: &str) -> String {
    match entity::decode(nevent) {
        Ok(Entity::Nevent(pointer)) => pointer.id,
        Ok(_) => {
            warn!("expected nevent, got a different entity: {}", nevent);
            nevent.to_string()
        }
        Err(e) => {
            warn!("failed to decode nevent: {}", e);
            nevent.to_string()
        }
    }
}
