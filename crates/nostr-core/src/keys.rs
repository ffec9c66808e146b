//! Key pair generation, derivation, and validation.
//!
//! Private and public keys are carried as 64-char hex strings at the API
//! boundary; the underlying scalar/point math goes through secp256k1.

use bitcoin::key::Secp256k1;
use bitcoin::secp256k1::SecretKey;
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Errors that can occur during key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key format")]
    InvalidPrivateKey,

    #[error("invalid public key format")]
    InvalidPublicKey,

    #[error("key derivation error: {0}")]
    Derivation(String),
}

/// A Nostr key pair, both halves hex-encoded.
///
/// Invariant: `public_key` is derivable from `private_key`; pairs that do not
/// satisfy this are rejected by [`validate_keypair`].
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// 64-char hex private scalar
    pub private_key: String,
    /// 64-char hex x-only public key
    pub public_key: String,
}

impl std::fmt::Debug for KeyPair {
    // Keep the private half out of logs and panic messages.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Structural check: 64 hex chars (either case).
///
/// Does NOT verify the key is a valid curve scalar; that happens when the
/// key is actually used.
pub fn is_valid_private_key(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Structural check: 64 hex chars (either case).
///
/// Does NOT verify the key is on-curve.
pub fn is_valid_public_key(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Decode a hex private key into 32 bytes, rejecting malformed input and
/// out-of-range scalars.
pub(crate) fn parse_private_key(key: &str) -> Result<[u8; 32], KeyError> {
    if !is_valid_private_key(key) {
        return Err(KeyError::InvalidPrivateKey);
    }
    let bytes = hex::decode(key).map_err(|_| KeyError::InvalidPrivateKey)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    SecretKey::from_slice(&out).map_err(|_| KeyError::InvalidPrivateKey)?;
    Ok(out)
}

/// Generate a new key pair from the system CSPRNG.
///
/// Panics only if no secure randomness source is available, which is fatal
/// by contract.
pub fn generate_keypair() -> KeyPair {
    let secp = Secp256k1::new();
    let mut bytes = [0u8; 32];

    // An all-zero or >= curve-order scalar is rejected by from_slice;
    // probability ~2^-128, but loop anyway.
    let sk = loop {
        rand::rng().fill_bytes(&mut bytes);
        if let Ok(sk) = SecretKey::from_slice(&bytes) {
            break sk;
        }
    };

    let (xonly, _parity) = sk.x_only_public_key(&secp);
    KeyPair {
        private_key: hex::encode(bytes),
        public_key: hex::encode(xonly.serialize()),
    }
}

/// Derive the x-only public key (hex) from a hex private key.
pub fn public_key_from_private(private_key: &str) -> Result<String, KeyError> {
    let bytes = parse_private_key(private_key)?;
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&bytes).map_err(|e| KeyError::Derivation(e.to_string()))?;
    let (xonly, _parity) = sk.x_only_public_key(&secp);
    Ok(hex::encode(xonly.serialize()))
}

/// Check that a key pair is internally consistent: both halves well-formed
/// and the public key derivable from the private key.
pub fn validate_keypair(keys: &KeyPair) -> bool {
    if !is_valid_private_key(&keys.private_key) || !is_valid_public_key(&keys.public_key) {
        return false;
    }
    match public_key_from_private(&keys.private_key) {
        Ok(derived) => derived == keys.public_key.to_lowercase(),
        Err(_) => false,
    }
}

/// Import a private key, deriving its public half.
pub fn import_private_key(private_key: &str) -> Result<KeyPair, KeyError> {
    let public_key = public_key_from_private(private_key)?;
    Ok(KeyPair {
        private_key: private_key.to_string(),
        public_key,
    })
}

/// Constant-time string comparison.
///
/// Total time is independent of where the strings first differ; used
/// wherever secrets are compared. Differing lengths return early, which
/// leaks only the length.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair_shape() {
        let keys = generate_keypair();
        assert_eq!(keys.private_key.len(), 64);
        assert_eq!(keys.public_key.len(), 64);
        assert!(keys.private_key.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(keys.public_key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_keypair_validates() {
        let keys = generate_keypair();
        assert!(validate_keypair(&keys));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let keys = generate_keypair();
        let pk = public_key_from_private(&keys.private_key).unwrap();
        for _ in 0..5 {
            assert_eq!(public_key_from_private(&keys.private_key).unwrap(), pk);
        }
    }

    #[test]
    fn test_mismatched_pair_is_rejected() {
        let a = generate_keypair();
        let b = generate_keypair();
        let mixed = KeyPair {
            private_key: a.private_key,
            public_key: b.public_key,
        };
        assert!(!validate_keypair(&mixed));
    }

    #[test]
    fn test_import_private_key() {
        let keys = generate_keypair();
        let imported = import_private_key(&keys.private_key).unwrap();
        assert_eq!(imported.public_key, keys.public_key);
    }

    #[test]
    fn test_import_rejects_malformed() {
        assert!(import_private_key("").is_err());
        assert!(import_private_key("zz").is_err());
        assert!(import_private_key(&"g".repeat(64)).is_err());
        // structurally valid hex but not a valid scalar
        assert!(import_private_key(&"0".repeat(64)).is_err());
    }

    #[test]
    fn test_structural_validation() {
        assert!(is_valid_private_key(&"a".repeat(64)));
        assert!(is_valid_private_key(&"A".repeat(64)));
        assert!(!is_valid_private_key(&"a".repeat(63)));
        assert!(!is_valid_private_key(&"a".repeat(65)));
        assert!(!is_valid_private_key(&"g".repeat(64)));

        assert!(is_valid_public_key(&"0".repeat(64)));
        assert!(!is_valid_public_key("short"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let keys = generate_keypair();
        let rendered = format!("{:?}", keys);
        assert!(!rendered.contains(&keys.private_key));
        assert!(rendered.contains("<redacted>"));
    }
}
