//! Key custody and record encryption for MedVault.
//!
//! Record confidentiality must survive a compromised database: record bytes
//! and the symmetric keys protecting them are both persisted, but a patient's
//! data key is only ever stored wrapped under a key derived from that
//! patient's login password.
//!
//! # Architecture
//!
//! The encryption uses a two-tier key system:
//!
//! 1. **Password-derived key**: PBKDF2-HMAC-SHA256 over the patient's login
//!    password and a per-patient salt. Never stored - re-derived on every
//!    decrypt request.
//!
//! 2. **Data key**: A random AES-256 key generated once at patient
//!    registration. Stored wrapped (AES-256-GCM) under the password-derived
//!    key; exists in cleartext only transiently in memory.
//!
//! Accounts created before per-patient salting have no stored salt and
//! derive with a fixed legacy salt instead. That path is preserved for
//! compatibility and never used for new registrations.

mod cipher;
mod envelope;
mod error;
mod key;

pub use cipher::{decrypt, encrypt, TAG_SIZE};
pub use envelope::{
    provision_envelope, unwrap_data_key, wrap_data_key, KeyEnvelope,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, derive_key_legacy, generate_nonce, DataKey, DerivedKey, Salt,
    KEY_SIZE, LEGACY_SALT, NONCE_SIZE, PBKDF2_ITERATIONS, SALT_SIZE,
};
