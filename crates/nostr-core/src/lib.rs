//! Nostr protocol core for Relay16.
//!
//! This crate provides:
//! - Event structure, canonical serialization, Schnorr signing and
//!   verification
//! - Typed constructors for the event kinds the client produces
//! - Key pair generation, derivation, and validation
//! - Password-based private key encryption (PBKDF2 + AES-256-GCM)
//! - bech32 entities (npub, nsec, note, nprofile, nevent)
//! - Relay information document types
//! - Stateless event collection utilities (dedup, sort, filter)
//!
//! Everything here is pure protocol logic; networking lives in
//! `nostr-client` and persistence in `nostr-store`.

mod builders;
mod crypto;
mod entity;
mod event;
mod keys;
mod relay_info;
mod tags;
mod util;

pub use event::{
    Event, EventError, EventTemplate, KIND_CONTACTS, KIND_DELETE, KIND_METADATA, KIND_REACTION,
    KIND_REPOST, KIND_TEXT_NOTE, UnsignedEvent, create_event, get_event_hash, serialize_event,
    validate_event_structure, validate_unsigned_event, verify_event_signature,
};

pub use builders::{
    Contact, add_hashtags, create_contacts_event, create_delete_event, create_metadata_event,
    create_reaction_event, create_repost_event, create_text_note,
};

pub use tags::{
    event_age, extract_event_references, extract_hashtags, extract_mentions, is_recent, is_reply,
    mentions_pubkey,
};

pub use keys::{
    KeyError, KeyPair, constant_time_eq, generate_keypair, import_private_key,
    is_valid_private_key, is_valid_public_key, public_key_from_private, validate_keypair,
};

pub use crypto::{
    CryptoError, EncryptedKeyRecord, IV_SIZE, KEY_DERIVATION_ITERATIONS, KEY_SIZE, SALT_SIZE,
    decrypt_private_key, derive_key, encrypt_private_key,
};

pub use entity::{
    Entity, EntityError, EventPointer, ProfilePointer, decode, encode_nevent, encode_note,
    encode_nprofile, encode_npub, encode_nsec,
};

pub use relay_info::{RELAY_INFO_ACCEPT_HEADER, RelayInformation, RelayLimitation};

pub use util::{
    deduplicate_events, event_id_to_nevent, filter_events_by_author, filter_events_by_kind,
    filter_events_by_time_range, is_valid_hex, nevent_to_event_id, npub_to_pubkey, pubkey_to_npub,
    sort_events_by_time,
};
