//! Key material: random generation and password-based derivation.
//!
//! All random bytes come from the OS CSPRNG. Generator failure is fatal to
//! the process, not a recoverable condition.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of data keys and password-derived keys in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the PBKDF2 salt in bytes.
pub const SALT_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Fixed salt shared by every account created before per-patient salting.
///
/// A shared salt defeats the purpose of salting; this exists only so that
/// envelopes persisted without a salt still unwrap. New accounts always get
/// a random per-patient salt.
pub const LEGACY_SALT: &[u8; SALT_SIZE] = b"ThisIsAFixedSalt";

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).expect("OS random generator failed");
    buf
}

/// A patient's AES-256 data key.
///
/// Exists in cleartext only transiently during wrap/unwrap/encrypt/decrypt;
/// zeroed on drop and never persisted or serialized.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey([u8; KEY_SIZE]);

impl DataKey {
    /// Generates a fresh random data key.
    pub fn generate() -> Self {
        Self(random_bytes())
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DataKey(..)")
    }
}

/// A key derived from a login password. Zeroed on drop, never stored.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// PBKDF2 salt stored alongside a patient's wrapped key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh random salt.
    pub fn random() -> Self {
        Self(random_bytes())
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// Generates a fresh random GCM nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    random_bytes()
}

/// Derives a 256-bit key from a password and salt.
///
/// PBKDF2-HMAC-SHA256, 10,000 iterations. Deterministic: the same
/// password and salt always yield the same key.
pub fn derive_key(password: &str, salt: &Salt) -> DerivedKey {
    derive(password, salt.as_bytes())
}

/// Derives a key with the fixed legacy salt.
///
/// Only for envelopes persisted without a salt. Never used for new accounts.
pub fn derive_key_legacy(password: &str) -> DerivedKey {
    derive(password, LEGACY_SALT)
}

fn derive(password: &str, salt: &[u8]) -> DerivedKey {
    let mut out = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    let key = DerivedKey::from_bytes(out);
    out.zeroize();
    key
}
