//! The record service: registration, upload, listing, and access-gated
//! decryption.
//!
//! Each operation is a stateless unit of work over the directories. PBKDF2
//! runs synchronously here; callers on a cooperative scheduler should move
//! these calls off the reactor thread.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use medvault_crypto::{provision_envelope, KeyEnvelope};

use crate::access::AccessGate;
use crate::directory::{AssignmentLinks, DoctorDirectory, PatientDirectory, RecordStore};
use crate::error::{RecordError, RecordResult};
use crate::model::{
    DoctorId, DoctorProfile, MedicalRecord, PatientId, PatientProfile, RecordId, RecordSummary,
    RecordUpload, Requester,
};

/// Outcome of an assignment change. Repeating an assignment or removing an
/// absent one is reported, not treated as an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Applied,
    /// The relation already held (assign) or did not hold (unassign).
    Unchanged,
}

/// Orchestrates key custody and record access over the directory seams.
pub struct RecordService {
    patients: Arc<dyn PatientDirectory>,
    doctors: Arc<dyn DoctorDirectory>,
    records: Arc<dyn RecordStore>,
    assignments: Arc<dyn AssignmentLinks>,
    gate: AccessGate,
}

impl RecordService {
    pub fn new(
        patients: Arc<dyn PatientDirectory>,
        doctors: Arc<dyn DoctorDirectory>,
        records: Arc<dyn RecordStore>,
        assignments: Arc<dyn AssignmentLinks>,
    ) -> Self {
        let gate = AccessGate::new(assignments.clone());
        Self {
            patients,
            doctors,
            records,
            assignments,
            gate,
        }
    }

    /// Registers a patient, provisioning their key envelope exactly once.
    pub fn register_patient(
        &self,
        username: &str,
        password: &str,
        date_of_birth: Option<String>,
        contact_number: Option<String>,
        address: Option<String>,
    ) -> RecordResult<PatientId> {
        let envelope = provision_envelope(password)?;
        let profile = PatientProfile {
            id: PatientId::new(),
            username: username.to_string(),
            envelope,
            date_of_birth,
            contact_number,
            address,
            registered_at: Utc::now(),
        };
        let id = profile.id;
        self.patients.insert(profile);
        debug!(patient = %id, "registered patient");
        Ok(id)
    }

    /// Registers a doctor. Doctors carry no key material.
    pub fn register_doctor(
        &self,
        username: &str,
        specialty: Option<String>,
        license_number: Option<String>,
    ) -> RecordResult<DoctorId> {
        let profile = DoctorProfile {
            id: DoctorId::new(),
            username: username.to_string(),
            specialty,
            license_number,
        };
        let id = profile.id;
        self.doctors.insert(profile);
        debug!(doctor = %id, "registered doctor");
        Ok(id)
    }

    /// Links a doctor to a patient.
    pub fn assign_patient(
        &self,
        doctor_id: DoctorId,
        patient_id: PatientId,
    ) -> RecordResult<AssignmentOutcome> {
        self.doctors
            .get(doctor_id)
            .ok_or(RecordError::DoctorProfileNotFound(doctor_id))?;
        self.patients
            .get(patient_id)
            .ok_or(RecordError::PatientProfileNotFound(patient_id))?;

        if self.assignments.assign(doctor_id, patient_id) {
            debug!(doctor = %doctor_id, patient = %patient_id, "assigned patient");
            Ok(AssignmentOutcome::Applied)
        } else {
            Ok(AssignmentOutcome::Unchanged)
        }
    }

    /// Removes a doctor-patient link.
    pub fn unassign_patient(
        &self,
        doctor_id: DoctorId,
        patient_id: PatientId,
    ) -> RecordResult<AssignmentOutcome> {
        self.doctors
            .get(doctor_id)
            .ok_or(RecordError::DoctorProfileNotFound(doctor_id))?;
        self.patients
            .get(patient_id)
            .ok_or(RecordError::PatientProfileNotFound(patient_id))?;

        if self.assignments.unassign(doctor_id, patient_id) {
            debug!(doctor = %doctor_id, patient = %patient_id, "unassigned patient");
            Ok(AssignmentOutcome::Applied)
        } else {
            Ok(AssignmentOutcome::Unchanged)
        }
    }

    /// Stores an already-encrypted record for a patient.
    ///
    /// `uploader` records the authoring clinician when a doctor uploads on
    /// the patient's behalf. Records are read-only after this call.
    pub fn upload_record(
        &self,
        patient_id: PatientId,
        uploader: Option<DoctorId>,
        upload: RecordUpload,
    ) -> RecordResult<RecordId> {
        self.patients
            .get(patient_id)
            .ok_or(RecordError::PatientProfileNotFound(patient_id))?;
        if let Some(doctor_id) = uploader {
            self.doctors
                .get(doctor_id)
                .ok_or(RecordError::DoctorProfileNotFound(doctor_id))?;
        }

        let now = Utc::now();
        let record = MedicalRecord {
            id: RecordId::new(),
            patient_id,
            doctor_id: uploader,
            record_type: upload.record_type,
            file_name: upload.file_name,
            content_type: upload.content_type,
            encrypted_content: upload.encrypted_content,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;
        self.records.insert(record);
        debug!(record = %id, patient = %patient_id, "uploaded record");
        Ok(id)
    }

    /// Encrypts record content under a patient's data key.
    ///
    /// Unwraps the data key with the password, then encrypts with the nonce
    /// stored in the patient's envelope. Fails with
    /// [`RecordError::WrongPassword`] when the password does not unwrap.
    pub fn encrypt_record_content(
        &self,
        patient_id: PatientId,
        password: &str,
        plaintext: &[u8],
    ) -> RecordResult<Vec<u8>> {
        let patient = self
            .patients
            .get(patient_id)
            .ok_or(RecordError::PatientProfileNotFound(patient_id))?;

        let data_key = patient
            .envelope
            .unwrap_with_password(password)
            .map_err(RecordError::from_unwrap)?;

        let ciphertext =
            medvault_crypto::encrypt(plaintext, data_key.as_bytes(), &patient.envelope.nonce)?;
        Ok(ciphertext)
    }

    /// Decrypts a record's content for an authorized requester.
    ///
    /// Lookup, access gate, key derivation, key unwrap, content decrypt, in
    /// that order. Tag failure during unwrap surfaces as
    /// [`RecordError::WrongPassword`] and content decryption is never
    /// attempted. Plaintext is returned once and not persisted; the derived
    /// key and data key are dropped before returning.
    pub fn decrypt_record(
        &self,
        record_id: RecordId,
        password: &str,
        requester: Requester,
    ) -> RecordResult<Vec<u8>> {
        let record = self
            .records
            .get(record_id)
            .ok_or(RecordError::RecordNotFound(record_id))?;
        let patient = self
            .patients
            .get(record.patient_id)
            .ok_or(RecordError::PatientProfileNotFound(record.patient_id))?;

        if !self.gate.may_decrypt(requester, patient.id) {
            warn!(record = %record_id, ?requester, "decrypt denied");
            return Err(RecordError::AccessDenied);
        }

        // Derivation mode (salted vs legacy) follows the stored envelope
        let data_key = patient
            .envelope
            .unwrap_with_password(password)
            .map_err(RecordError::from_unwrap)?;

        // Content was encrypted under the patient's stored nonce, not a
        // per-record one (inherited storage layout)
        let plaintext = medvault_crypto::decrypt(
            &record.encrypted_content,
            data_key.as_bytes(),
            &patient.envelope.nonce,
        )?;

        debug!(record = %record_id, "decrypted record");
        Ok(plaintext)
    }

    /// Lists record metadata for a patient.
    ///
    /// Authorization failure and unknown patients yield an empty collection
    /// rather than an error. The decrypt path does not share this behavior;
    /// the asymmetry is part of the caller contract.
    pub fn list_patient_records(
        &self,
        patient_id: PatientId,
        requester: Requester,
    ) -> Vec<RecordSummary> {
        if self.patients.get(patient_id).is_none() {
            return Vec::new();
        }
        if !self.gate.may_list(requester, patient_id) {
            warn!(patient = %patient_id, ?requester, "list denied");
            return Vec::new();
        }

        self.records
            .records_for_patient(patient_id)
            .iter()
            .map(RecordSummary::from)
            .collect()
    }

    /// Lists records authored by a doctor, across all their patients.
    /// Unknown doctors yield an empty collection (inherited list behavior).
    pub fn list_doctor_records(&self, doctor_id: DoctorId) -> Vec<RecordSummary> {
        if self.doctors.get(doctor_id).is_none() {
            return Vec::new();
        }
        self.records
            .records_for_doctor(doctor_id)
            .iter()
            .map(RecordSummary::from)
            .collect()
    }

    /// Read-only view of a patient's stored envelope (for collaborators
    /// that persist it elsewhere).
    pub fn patient_envelope(&self, patient_id: PatientId) -> RecordResult<KeyEnvelope> {
        let patient = self
            .patients
            .get(patient_id)
            .ok_or(RecordError::PatientProfileNotFound(patient_id))?;
        Ok(patient.envelope)
    }
}
