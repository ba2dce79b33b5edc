//! Per-patient key envelopes.
//!
//! A patient's data key is wrapped (AES-256-GCM) under their password-derived
//! key. The persisted triple is the wrapped key, the GCM nonce, and the
//! PBKDF2 salt. The salt is absent for accounts created before per-patient
//! salting; those derive with the fixed legacy salt instead.

use serde::{Deserialize, Serialize};

use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{
    derive_key, derive_key_legacy, generate_nonce, DataKey, DerivedKey, Salt,
    KEY_SIZE, NONCE_SIZE,
};

/// Persisted key-custody triple attached 1:1 to a patient.
///
/// Binary fields serialize as Base64 strings for binary-to-text transport.
/// The wrapped key decodes to 48 bytes: 32 key bytes plus the 16-byte tag.
///
/// The single nonce is reused for both key wrap and record content
/// encryption under the unwrapped data key (inherited storage layout).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyEnvelope {
    /// Data key encrypted under the password-derived key.
    #[serde(with = "b64")]
    pub wrapped_data_key: Vec<u8>,
    /// GCM nonce shared by key wrap and content encryption.
    #[serde(with = "b64_nonce")]
    pub nonce: [u8; NONCE_SIZE],
    /// PBKDF2 salt. `None` means legacy derivation with the fixed salt.
    #[serde(with = "b64_salt", default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<Salt>,
}

impl KeyEnvelope {
    /// Derives the password key in the mode this envelope was created with:
    /// salted PBKDF2 when a salt is stored, legacy fixed-salt otherwise.
    pub fn derive_password_key(&self, password: &str) -> DerivedKey {
        match &self.salt {
            Some(salt) => derive_key(password, salt),
            None => derive_key_legacy(password),
        }
    }

    /// Recovers the data key given the patient's password.
    ///
    /// [`CryptoError::AuthenticationFailure`] means wrong password.
    pub fn unwrap_with_password(&self, password: &str) -> CryptoResult<DataKey> {
        let password_key = self.derive_password_key(password);
        unwrap_data_key(&self.wrapped_data_key, &password_key, &self.nonce)
    }
}

/// Wraps a data key under a password-derived key.
pub fn wrap_data_key(
    data_key: &DataKey,
    password_key: &DerivedKey,
    nonce: &[u8; NONCE_SIZE],
) -> CryptoResult<Vec<u8>> {
    cipher::encrypt(data_key.as_bytes(), password_key.as_bytes(), nonce)
}

/// Unwraps a data key, propagating tag-verification failure unchanged.
pub fn unwrap_data_key(
    wrapped: &[u8],
    password_key: &DerivedKey,
    nonce: &[u8; NONCE_SIZE],
) -> CryptoResult<DataKey> {
    let plaintext = cipher::decrypt(wrapped, password_key.as_bytes(), nonce)?;

    if plaintext.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: plaintext.len(),
        });
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&plaintext);
    Ok(DataKey::from_bytes(bytes))
}

/// Provisions the key envelope for a new patient.
///
/// Generates a fresh salt, nonce, and data key, derives the password key,
/// and wraps the data key. Called exactly once at patient registration; the
/// transient data key is zeroed before this returns.
pub fn provision_envelope(password: &str) -> CryptoResult<KeyEnvelope> {
    let salt = Salt::random();
    let nonce = generate_nonce();
    let data_key = DataKey::generate();

    let password_key = derive_key(password, &salt);
    let wrapped_data_key = wrap_data_key(&data_key, &password_key, &nonce)?;

    Ok(KeyEnvelope {
        wrapped_data_key,
        nonce,
        salt: Some(salt),
    })
}

mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

mod b64_nonce {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::key::NONCE_SIZE;

    pub fn serialize<S: Serializer>(
        nonce: &[u8; NONCE_SIZE],
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(nonce))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<[u8; NONCE_SIZE], D::Error> {
        let s = String::deserialize(de)?;
        let bytes = STANDARD.decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("nonce must be 12 bytes"))
    }
}

mod b64_salt {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::key::{Salt, SALT_SIZE};

    pub fn serialize<S: Serializer>(salt: &Option<Salt>, ser: S) -> Result<S::Ok, S::Error> {
        match salt {
            Some(salt) => ser.serialize_some(&STANDARD.encode(salt.as_bytes())),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Salt>, D::Error> {
        let s: Option<String> = Option::deserialize(de)?;
        match s {
            Some(s) => {
                let bytes = STANDARD.decode(&s).map_err(serde::de::Error::custom)?;
                let arr: [u8; SALT_SIZE] = bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("salt must be 16 bytes"))?;
                Ok(Some(Salt::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }
}
