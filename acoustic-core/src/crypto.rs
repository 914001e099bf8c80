//! Password-derived authenticated encryption and secret-based auth tokens.
//!
//! Key derivation is PBKDF2-HMAC-SHA256 with a fresh random salt per packet;
//! encryption is AES-256-GCM with a fresh random nonce per packet. Both the
//! salt and nonce travel in the clear as part of the cipher-blob (see
//! [`crate::packet`]) - this is standard practice for password-based AEAD and
//! is why two calls to [`encrypt`] with identical inputs never produce the
//! same bytes.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::CoreError;

/// PBKDF2-HMAC-SHA256 iteration count. Fixed, not configurable: both sides
/// of the link must derive the same key from the same password and salt.
pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Random salt length, in bytes, prepended to every cipher-blob.
pub const SALT_LEN: usize = 16;
/// Random nonce length, in bytes, for AES-256-GCM.
pub const NONCE_LEN: usize = 12;
/// AES-256-GCM authentication tag length, in bytes.
pub const TAG_LEN: usize = 16;
/// Length of the auth token carried in an AUTH packet body.
pub const TOKEN_LEN: usize = 4;
/// Minimum valid cipher-blob length: salt + nonce + tag, zero ciphertext bytes.
pub const MIN_BLOB_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Derive a 32-byte AES-256 key from a password and salt via PBKDF2-HMAC-SHA256.
pub fn derive_key(password: &[u8], salt: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypt `plaintext` under `password`, returning `salt || nonce || ciphertext || tag`.
///
/// Fresh random salt and nonce are generated for every call. Rejects an
/// empty password with [`CoreError::AuthFailure`] rather than deriving a key
/// from it - an empty password is never a meaningful secret on this link.
pub fn encrypt(password: &str, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
    if password.is_empty() {
        return Err(CoreError::AuthFailure);
    }

    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let key_bytes = derive_key(password.as_bytes(), &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CoreError::AuthFailure)?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a `salt || nonce || ciphertext || tag` blob under `password`.
///
/// Fails with [`CoreError::AuthFailure`] if the blob is too short to contain
/// a salt, nonce and tag, if `password` is empty, or if the GCM tag does not
/// verify (wrong password or corrupted blob).
pub fn decrypt(password: &str, blob: &[u8]) -> Result<Vec<u8>, CoreError> {
    if password.is_empty() || blob.len() < MIN_BLOB_LEN {
        return Err(CoreError::AuthFailure);
    }

    let salt = &blob[0..SALT_LEN];
    let nonce_bytes = &blob[SALT_LEN..SALT_LEN + NONCE_LEN];
    let ciphertext = &blob[SALT_LEN + NONCE_LEN..];

    let key_bytes = derive_key(password.as_bytes(), salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CoreError::AuthFailure)
}

/// First 4 bytes of SHA-256 over the UTF-8 encoding of `secret`.
pub fn auth_token(secret: &str) -> [u8; TOKEN_LEN] {
    let digest = Sha256::digest(secret.as_bytes());
    let mut token = [0u8; TOKEN_LEN];
    token.copy_from_slice(&digest[0..TOKEN_LEN]);
    token
}

/// Constant-time comparison of a received token against `auth_token(expected_secret)`.
pub fn auth_verify(received: &[u8; TOKEN_LEN], expected_secret: &str) -> bool {
    let expected = auth_token(expected_secret);
    received.ct_eq(&expected).into()
}
