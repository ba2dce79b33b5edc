//! AES-256-GCM authenticated encryption.
//!
//! One primitive serves two uses: wrapping a patient's data key under a
//! password-derived key, and encrypting record content under the data key.
//! The nonce is caller-supplied because the persisted per-patient nonce is
//! shared between both uses (inherited storage layout).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KEY_SIZE, NONCE_SIZE};

/// Size of the GCM authentication tag appended to the ciphertext.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` with AES-256-GCM.
///
/// Returns ciphertext with the 128-bit authentication tag appended.
pub fn encrypt(
    plaintext: &[u8],
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Decrypts AES-256-GCM ciphertext produced by [`encrypt`].
///
/// Fails with [`CryptoError::AuthenticationFailure`] when the tag does not
/// verify (wrong key and/or tampered ciphertext). Callers must treat that as
/// the canonical "wrong password" signal and never interpret partial output.
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::AuthenticationFailure);
    }
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailure)
}
