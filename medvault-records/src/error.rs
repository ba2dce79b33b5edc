//! Error types for the record service.

use thiserror::Error;

use crate::model::{DoctorId, PatientId, RecordId};

/// All errors that can occur in record operations.
///
/// The decrypt path always surfaces these as typed values; only the list
/// path maps authorization failure to an empty collection (caller contract
/// inherited from the surrounding product).
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("patient profile not found: {0}")]
    PatientProfileNotFound(PatientId),

    #[error("doctor profile not found: {0}")]
    DoctorProfileNotFound(DoctorId),

    #[error("access denied: requester may not decrypt this record")]
    AccessDenied,

    /// Key unwrap failed tag verification. Requires a new password from the
    /// user; never retried automatically.
    #[error("wrong password: key unwrap failed authentication")]
    WrongPassword,

    /// Cryptographic failure other than a wrong password: content that
    /// fails tag verification under the correct data key, or a cipher
    /// setup error.
    #[error("crypto error: {0}")]
    Crypto(#[from] medvault_crypto::CryptoError),
}

impl RecordError {
    /// Maps a key-unwrap failure: tag mismatch there is the canonical
    /// wrong-password signal.
    pub(crate) fn from_unwrap(err: medvault_crypto::CryptoError) -> Self {
        match err {
            medvault_crypto::CryptoError::AuthenticationFailure => RecordError::WrongPassword,
            other => RecordError::Crypto(other),
        }
    }
}

pub type RecordResult<T> = Result<T, RecordError>;
