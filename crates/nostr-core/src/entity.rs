//! bech32-encoded protocol entities.
//!
//! Human-friendly identifiers for keys and events:
//! - `npub` / `nsec` — bare 32-byte public/private keys
//! - `note` — bare 32-byte event id
//! - `nprofile` / `nevent` — TLV payloads with optional relay hints
//!
//! This module is the strict codec; lenient best-effort wrappers that fall
//! back to the input live in [`crate::util`].

use bech32::{Bech32, Hrp};
use thiserror::Error;

/// TLV type for the primary payload (pubkey or event id).
const TLV_SPECIAL: u8 = 0;

/// TLV type for a relay hint.
const TLV_RELAY: u8 = 1;

/// Errors that can occur while encoding or decoding entities.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("invalid hex payload: {0}")]
    InvalidHex(String),

    #[error("payload must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("bech32 encode error: {0}")]
    Bech32Encode(String),

    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    #[error("unknown prefix: {0}")]
    UnknownPrefix(String),

    #[error("malformed TLV payload: {0}")]
    InvalidTlv(String),
}

/// A profile reference: pubkey plus optional relay hints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePointer {
    /// hex public key
    pub pubkey: String,
    /// relays where the profile is likely to be found
    pub relays: Vec<String>,
}

/// An event reference: event id plus optional relay hints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPointer {
    /// hex event id
    pub id: String,
    /// relays where the event is likely to be found
    pub relays: Vec<String>,
}

/// A decoded bech32 entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// Public key (hex)
    Npub(String),
    /// Private key (hex)
    Nsec(String),
    /// Event id (hex)
    Note(String),
    /// Profile pointer with relay hints
    Nprofile(ProfilePointer),
    /// Event pointer with relay hints
    Nevent(EventPointer),
}

fn decode_hex32(hex_str: &str) -> Result<[u8; 32], EntityError> {
    let bytes = hex::decode(hex_str).map_err(|e| EntityError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(EntityError::InvalidLength(bytes.len()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn encode_bare(prefix: &str, hex_payload: &str) -> Result<String, EntityError> {
    let payload = decode_hex32(hex_payload)?;
    let hrp = Hrp::parse(prefix).map_err(|e| EntityError::Bech32Encode(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, &payload).map_err(|e| EntityError::Bech32Encode(e.to_string()))
}

/// Encode a hex public key as `npub1...`.
pub fn encode_npub(pubkey: &str) -> Result<String, EntityError> {
    encode_bare("npub", pubkey)
}

/// Encode a hex private key as `nsec1...`.
pub fn encode_nsec(private_key: &str) -> Result<String, EntityError> {
    encode_bare("nsec", private_key)
}

/// Encode a hex event id as `note1...`.
pub fn encode_note(event_id: &str) -> Result<String, EntityError> {
    encode_bare("note", event_id)
}

fn encode_tlv(prefix: &str, special: &[u8; 32], relays: &[String]) -> Result<String, EntityError> {
    let mut payload = Vec::with_capacity(34 + relays.iter().map(|r| r.len() + 2).sum::<usize>());
    payload.push(TLV_SPECIAL);
    payload.push(32);
    payload.extend_from_slice(special);
    for relay in relays {
        if relay.len() > u8::MAX as usize {
            return Err(EntityError::InvalidTlv(format!(
                "relay url too long for TLV: {}",
                relay
            )));
        }
        payload.push(TLV_RELAY);
        payload.push(relay.len() as u8);
        payload.extend_from_slice(relay.as_bytes());
    }

    let hrp = Hrp::parse(prefix).map_err(|e| EntityError::Bech32Encode(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, &payload).map_err(|e| EntityError::Bech32Encode(e.to_string()))
}

/// Encode a profile pointer as `nprofile1...`.
pub fn encode_nprofile(pointer: &ProfilePointer) -> Result<String, EntityError> {
    let payload = decode_hex32(&pointer.pubkey)?;
    encode_tlv("nprofile", &payload, &pointer.relays)
}

/// Encode an event pointer as `nevent1...`.
pub fn encode_nevent(pointer: &EventPointer) -> Result<String, EntityError> {
    let payload = decode_hex32(&pointer.id)?;
    encode_tlv("nevent", &payload, &pointer.relays)
}

fn parse_tlv(data: &[u8]) -> Result<(Option<[u8; 32]>, Vec<String>), EntityError> {
    let mut special = None;
    let mut relays = Vec::new();
    let mut cursor = 0usize;

    while cursor < data.len() {
        if cursor + 2 > data.len() {
            return Err(EntityError::InvalidTlv("truncated header".to_string()));
        }
        let tlv_type = data[cursor];
        let len = data[cursor + 1] as usize;
        cursor += 2;

        if cursor + len > data.len() {
            return Err(EntityError::InvalidTlv("truncated value".to_string()));
        }
        let value = &data[cursor..cursor + len];
        cursor += len;

        match tlv_type {
            TLV_SPECIAL => {
                if len != 32 {
                    return Err(EntityError::InvalidTlv(format!(
                        "special entry must be 32 bytes, got {}",
                        len
                    )));
                }
                let mut payload = [0u8; 32];
                payload.copy_from_slice(value);
                special = Some(payload);
            }
            TLV_RELAY => {
                let relay = String::from_utf8(value.to_vec())
                    .map_err(|_| EntityError::InvalidTlv("relay hint is not utf-8".to_string()))?;
                relays.push(relay);
            }
            // Unknown TLV types are skipped for forward compatibility
            _ => {}
        }
    }

    Ok((special, relays))
}

/// Decode any supported bech32 entity.
pub fn decode(encoded: &str) -> Result<Entity, EntityError> {
    let (hrp, data) =
        bech32::decode(encoded).map_err(|e| EntityError::Bech32Decode(e.to_string()))?;
    let prefix = hrp.to_string();

    match prefix.as_str() {
        "npub" | "nsec" | "note" => {
            if data.len() != 32 {
                return Err(EntityError::InvalidLength(data.len()));
            }
            let hex_payload = hex::encode(&data);
            Ok(match prefix.as_str() {
                "npub" => Entity::Npub(hex_payload),
                "nsec" => Entity::Nsec(hex_payload),
                _ => Entity::Note(hex_payload),
            })
        }
        "nprofile" => {
            let (special, relays) = parse_tlv(&data)?;
            let payload = special
                .ok_or_else(|| EntityError::InvalidTlv("missing pubkey entry".to_string()))?;
            Ok(Entity::Nprofile(ProfilePointer {
                pubkey: hex::encode(payload),
                relays,
            }))
        }
        "nevent" => {
            let (special, relays) = parse_tlv(&data)?;
            let payload = special
                .ok_or_else(|| EntityError::InvalidTlv("missing event id entry".to_string()))?;
            Ok(Entity::Nevent(EventPointer {
                id: hex::encode(payload),
                relays,
            }))
        }
        other => Err(EntityError::UnknownPrefix(other.to_string())),
    }
}
