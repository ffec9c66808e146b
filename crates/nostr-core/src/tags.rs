//! Pure helpers over event tags and timestamps.
//!
//! Extraction helpers scan the tag list in order and preserve insertion
//! order in their results. Time-based predicates take an explicit `now`
//! so they stay pure.

use crate::event::Event;

/// Collect the referenced pubkeys from `p` tags, in tag order.
pub fn extract_mentions(event: &Event) -> Vec<String> {
    extract_tag_values(event, "p")
}

/// Collect the referenced event ids from `e` tags, in tag order.
pub fn extract_event_references(event: &Event) -> Vec<String> {
    extract_tag_values(event, "e")
}

/// Collect the hashtags from `t` tags, in tag order.
pub fn extract_hashtags(event: &Event) -> Vec<String> {
    extract_tag_values(event, "t")
}

fn extract_tag_values(event: &Event, name: &str) -> Vec<String> {
    event
        .tags
        .iter()
        .filter(|tag| tag.len() >= 2 && tag[0] == name && !tag[1].is_empty())
        .map(|tag| tag[1].clone())
        .collect()
}

/// An event with any `e` tag is a reply (or otherwise references another
/// event).
pub fn is_reply(event: &Event) -> bool {
    event.tags.iter().any(|tag| tag.first().map(String::as_str) == Some("e"))
}

/// Whether the event carries a `p` tag for the given pubkey.
pub fn mentions_pubkey(event: &Event, pubkey: &str) -> bool {
    event
        .tags
        .iter()
        .any(|tag| tag.len() >= 2 && tag[0] == "p" && tag[1] == pubkey)
}

/// Age of the event in seconds at time `now` (unix seconds). Events from the
/// future count as age zero.
pub fn event_age(event: &Event, now: u64) -> u64 {
    now.saturating_sub(event.created_at)
}

/// Whether the event is at most `max_age_secs` old at time `now`.
pub fn is_recent(event: &Event, now: u64, max_age_secs: u64) -> bool {
    event_age(event, now) <= max_age_secs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_tags(tags: Vec<Vec<String>>) -> Event {
        Event {
            id: "a".repeat(64),
            pubkey: "b".repeat(64),
            created_at: 1_700_000_000,
            kind: 1,
            tags,
            content: String::new(),
            sig: "c".repeat(128),
        }
    }

    fn tag(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_mentions_preserves_order() {
        let event = event_with_tags(vec![
            tag(&["p", "pk1"]),
            tag(&["e", "ev1"]),
            tag(&["p", "pk2"]),
        ]);
        assert_eq!(extract_mentions(&event), vec!["pk1", "pk2"]);
    }

    #[test]
    fn test_extract_event_references() {
        let event = event_with_tags(vec![
            tag(&["e", "ev1", "wss://r.example.com"]),
            tag(&["e", "ev2"]),
        ]);
        assert_eq!(extract_event_references(&event), vec!["ev1", "ev2"]);
    }

    #[test]
    fn test_extract_hashtags() {
        let event = event_with_tags(vec![tag(&["t", "nostr"]), tag(&["t", "rust"])]);
        assert_eq!(extract_hashtags(&event), vec!["nostr", "rust"]);
    }

    #[test]
    fn test_extract_skips_malformed_tags() {
        let event = event_with_tags(vec![tag(&["p"]), tag(&["p", ""]), tag(&["p", "pk1"])]);
        assert_eq!(extract_mentions(&event), vec!["pk1"]);
    }

    #[test]
    fn test_is_reply() {
        assert!(is_reply(&event_with_tags(vec![tag(&["e", "ev1"])])));
        assert!(!is_reply(&event_with_tags(vec![tag(&["p", "pk1"])])));
        assert!(!is_reply(&event_with_tags(vec![])));
    }

    #[test]
    fn test_mentions_pubkey() {
        let event = event_with_tags(vec![tag(&["p", "pk1"])]);
        assert!(mentions_pubkey(&event, "pk1"));
        assert!(!mentions_pubkey(&event, "pk2"));
    }

    #[test]
    fn test_event_age() {
        let event = event_with_tags(vec![]);
        assert_eq!(event_age(&event, 1_700_000_060), 60);
        // future-dated events never underflow
        assert_eq!(event_age(&event, 1_600_000_000), 0);
    }

    #[test]
    fn test_is_recent() {
        let event = event_with_tags(vec![]);
        assert!(is_recent(&event, 1_700_000_060, 3600));
        assert!(!is_recent(&event, 1_700_010_000, 3600));
    }
}
