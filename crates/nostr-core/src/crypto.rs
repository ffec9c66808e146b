//! Password-based private key encryption.
//!
//! Implements at-rest protection for private keys using:
//! - PBKDF2-HMAC-SHA256 key derivation (100,000 iterations)
//! - AES-256-GCM authenticated encryption (96-bit IV, 128-bit salt)
//! - base64 encoding of the stored blobs
//!
//! Salt and IV are freshly random for every encryption, so encrypting the
//! same key twice yields different records. Decryption fails closed: a wrong
//! password or tampered ciphertext produces an error, never garbage bytes.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::keys::{is_valid_private_key, public_key_from_private};

/// PBKDF2 iteration count for password key derivation.
pub const KEY_DERIVATION_ITERATIONS: u32 = 100_000;

/// Size of the random salt in bytes (128 bits).
pub const SALT_SIZE: usize = 16;

/// Size of the AES-GCM IV in bytes (96 bits).
pub const IV_SIZE: usize = 12;

/// Size of the derived symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Errors that can occur during key encryption operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid record format: {0}")]
    InvalidFormat(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// A password-encrypted private key record, as persisted by the store.
///
/// All binary fields are base64; `public_key` stays hex so the owner of the
/// record can be identified without decrypting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeyRecord {
    /// base64 AES-GCM ciphertext (includes the auth tag)
    pub ciphertext: String,
    /// hex public key of the encrypted private key
    pub public_key: String,
    /// base64 random salt fed to PBKDF2
    pub salt: String,
    /// base64 random AES-GCM IV
    pub iv: String,
}

/// Derive a symmetric encryption key from a password.
///
/// Deterministic: the same password, salt, and iteration count always yield
/// the same key.
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Encrypt a private key with a password.
///
/// Generates a fresh salt and IV on every call, so the output differs even
/// for identical inputs. The private key must be structurally valid; the
/// matching public key is derived and stored alongside the ciphertext.
pub fn encrypt_private_key(
    private_key: &str,
    password: &str,
) -> Result<EncryptedKeyRecord, CryptoError> {
    if !is_valid_private_key(private_key) {
        return Err(CryptoError::InvalidKey(
            "private key must be 64 hex chars".to_string(),
        ));
    }
    let public_key =
        public_key_from_private(private_key).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let key = derive_key(password, &salt, KEY_DERIVATION_ITERATIONS);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), private_key.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedKeyRecord {
        ciphertext: BASE64.encode(ciphertext),
        public_key,
        salt: BASE64.encode(salt),
        iv: BASE64.encode(iv),
    })
}

/// Decrypt a private key record with a password.
///
/// Fails with [`CryptoError::Decryption`] on a wrong password or tampered
/// ciphertext (AES-GCM authenticates the payload), and rejects any plaintext
/// that is not a structurally valid private key.
pub fn decrypt_private_key(
    record: &EncryptedKeyRecord,
    password: &str,
) -> Result<String, CryptoError> {
    let ciphertext = BASE64
        .decode(&record.ciphertext)
        .map_err(|e| CryptoError::InvalidFormat(format!("ciphertext: {}", e)))?;
    let salt = BASE64
        .decode(&record.salt)
        .map_err(|e| CryptoError::InvalidFormat(format!("salt: {}", e)))?;
    let iv = BASE64
        .decode(&record.iv)
        .map_err(|e| CryptoError::InvalidFormat(format!("iv: {}", e)))?;

    if salt.len() != SALT_SIZE {
        return Err(CryptoError::InvalidFormat(format!(
            "salt must be {} bytes, got {}",
            SALT_SIZE,
            salt.len()
        )));
    }
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidFormat(format!(
            "iv must be {} bytes, got {}",
            IV_SIZE,
            iv.len()
        )));
    }

    let key = derive_key(password, &salt, KEY_DERIVATION_ITERATIONS);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
        .map_err(|_| CryptoError::Decryption("wrong password or corrupted data".to_string()))?;

    let private_key = String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("decrypted data is not valid utf-8".to_string()))?;

    if !is_valid_private_key(&private_key) {
        return Err(CryptoError::Decryption(
            "decrypted data is not a valid private key".to_string(),
        ));
    }

    Ok(private_key)
}
