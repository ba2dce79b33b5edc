//! Error types for the crypto layer.

use thiserror::Error;

/// All errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// GCM tag verification failed: wrong key and/or tampered ciphertext.
    /// This is the canonical "wrong password" signal for key unwrapping.
    #[error("authentication failure (wrong key or tampered data)")]
    AuthenticationFailure,

    /// Key material had the wrong length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Underlying cipher failure during encryption.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
