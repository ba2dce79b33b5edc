//! Domain model: patients, doctors, and encrypted medical records.

use chrono::{DateTime, Utc};
use medvault_crypto::KeyEnvelope;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Identifier of a patient profile.
    PatientId
);
id_type!(
    /// Identifier of a doctor profile.
    DoctorId
);
id_type!(
    /// Identifier of a medical record.
    RecordId
);

/// A patient profile with its persisted key envelope.
///
/// The envelope is created once at registration and never rotated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: PatientId,
    pub username: String,
    /// Wrapped data key, nonce, and derivation salt.
    pub envelope: KeyEnvelope,
    pub date_of_birth: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// A doctor profile. Doctors hold no key material; their decrypt access
/// comes solely from assignment links.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: DoctorId,
    pub username: String,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
}

/// An encrypted medical record. Read-only after upload.
///
/// `encrypted_content` was produced under the owning patient's data key and
/// the nonce stored in that patient's key envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: RecordId,
    pub patient_id: PatientId,
    /// Uploading clinician, if a doctor authored this record.
    pub doctor_id: Option<DoctorId>,
    pub record_type: String,
    pub file_name: String,
    pub content_type: String,
    pub encrypted_content: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata for a record upload. Content arrives already encrypted.
#[derive(Clone, Debug)]
pub struct RecordUpload {
    pub record_type: String,
    pub file_name: String,
    pub content_type: String,
    pub encrypted_content: Vec<u8>,
}

/// Metadata-only view of a record for list endpoints; no decryption.
#[derive(Clone, Debug, Serialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub patient_id: PatientId,
    pub doctor_id: Option<DoctorId>,
    pub record_type: String,
    pub file_name: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<&MedicalRecord> for RecordSummary {
    fn from(record: &MedicalRecord) -> Self {
        Self {
            id: record.id,
            patient_id: record.patient_id,
            doctor_id: record.doctor_id,
            record_type: record.record_type.clone(),
            file_name: record.file_name.clone(),
            content_type: record.content_type.clone(),
            created_at: record.created_at,
        }
    }
}

/// Identity on whose behalf an operation runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requester {
    Patient(PatientId),
    Doctor(DoctorId),
    /// Administrators may list record metadata but never decrypt content.
    Admin,
}
