//! Typed event constructors.
//!
//! Each constructor assembles the tag conventions for one event kind and
//! signs through [`create_event`]. Kind-specific rules live here so callers
//! never hand-build tag lists.

use serde::Serialize;

use crate::event::{
    Event, EventError, EventTemplate, KIND_CONTACTS, KIND_DELETE, KIND_METADATA, KIND_REACTION,
    KIND_REPOST, KIND_TEXT_NOTE, create_event,
};

/// A contact list entry: `["p", pubkey, relay_url?, petname?]`.
///
/// Optional fields are omitted from the tag, never written as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    /// Contact's hex public key
    pub pubkey: String,
    /// Preferred relay for this contact
    pub relay_url: Option<String>,
    /// Local nickname
    pub petname: Option<String>,
}

impl Contact {
    fn to_tag(&self) -> Vec<String> {
        let mut tag = vec!["p".to_string(), self.pubkey.clone()];
        if let Some(relay) = &self.relay_url {
            tag.push(relay.clone());
        }
        if let Some(petname) = &self.petname {
            tag.push(petname.clone());
        }
        tag
    }
}

/// Create a text note (kind 1). Caller-supplied tags pass through unchanged.
pub fn create_text_note(
    content: &str,
    tags: Vec<Vec<String>>,
    private_key: &str,
) -> Result<Event, EventError> {
    create_event(
        &EventTemplate {
            kind: KIND_TEXT_NOTE,
            content: content.to_string(),
            tags,
            created_at: None,
        },
        private_key,
    )
}

/// Create a metadata event (kind 0). Content is the JSON-serialized profile;
/// tags are empty.
pub fn create_metadata_event<T: Serialize>(
    metadata: &T,
    private_key: &str,
) -> Result<Event, EventError> {
    let content =
        serde_json::to_string(metadata).map_err(|e| EventError::Serialization(e.to_string()))?;
    create_event(
        &EventTemplate {
            kind: KIND_METADATA,
            content,
            tags: vec![],
            created_at: None,
        },
        private_key,
    )
}

/// Create a contact list event (kind 3), one `p` tag per contact.
pub fn create_contacts_event(
    contacts: &[Contact],
    private_key: &str,
) -> Result<Event, EventError> {
    let tags = contacts.iter().map(Contact::to_tag).collect();
    create_event(
        &EventTemplate {
            kind: KIND_CONTACTS,
            content: String::new(),
            tags,
            created_at: None,
        },
        private_key,
    )
}

/// Create a reaction event (kind 7) referencing the target event and author.
/// Content is the reaction glyph (e.g. `"+"`).
pub fn create_reaction_event(
    target_event_id: &str,
    target_author: &str,
    reaction: &str,
    private_key: &str,
) -> Result<Event, EventError> {
    create_event(
        &EventTemplate {
            kind: KIND_REACTION,
            content: reaction.to_string(),
            tags: vec![
                vec!["e".to_string(), target_event_id.to_string()],
                vec!["p".to_string(), target_author.to_string()],
            ],
            created_at: None,
        },
        private_key,
    )
}

/// Create a deletion request (kind 5), one `e` tag per event id to delete.
/// Content is the free-text reason. Deletion never mutates events in place;
/// it is itself a new event referencing the targets.
pub fn create_delete_event(
    event_ids: &[String],
    reason: &str,
    private_key: &str,
) -> Result<Event, EventError> {
    let tags = event_ids
        .iter()
        .map(|id| vec!["e".to_string(), id.clone()])
        .collect();
    create_event(
        &EventTemplate {
            kind: KIND_DELETE,
            content: reason.to_string(),
            tags,
            created_at: None,
        },
        private_key,
    )
}

/// Create a repost event (kind 6) referencing the original event, its
/// author, and a relay where it can be found.
pub fn create_repost_event(
    original_event_id: &str,
    original_author: &str,
    relay_url: &str,
    private_key: &str,
) -> Result<Event, EventError> {
    create_event(
        &EventTemplate {
            kind: KIND_REPOST,
            content: String::new(),
            tags: vec![
                vec![
                    "e".to_string(),
                    original_event_id.to_string(),
                    relay_url.to_string(),
                ],
                vec!["p".to_string(), original_author.to_string()],
            ],
            created_at: None,
        },
        private_key,
    )
}

/// Append hashtag tags (`["t", tag]`) to a template. Tags are lowercased and
/// stripped of a leading `#`.
pub fn add_hashtags(mut template: EventTemplate, hashtags: &[String]) -> EventTemplate {
    template.tags.extend(
        hashtags
            .iter()
            .map(|tag| vec!["t".to_string(), tag.trim_start_matches('#').to_lowercase()]),
    );
    template
}
