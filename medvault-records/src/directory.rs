//! Directory seams over the persistence collaborator.
//!
//! The service depends on these traits, never on a concrete database. The
//! in-memory implementations are the reference wiring and the test fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::model::{
    DoctorId, DoctorProfile, MedicalRecord, PatientId, PatientProfile, RecordId,
};

/// Lookup of patient profiles (owned by user management).
pub trait PatientDirectory: Send + Sync {
    fn insert(&self, profile: PatientProfile);
    fn get(&self, id: PatientId) -> Option<PatientProfile>;
}

/// Lookup of doctor profiles (owned by user management).
pub trait DoctorDirectory: Send + Sync {
    fn insert(&self, profile: DoctorProfile);
    fn get(&self, id: DoctorId) -> Option<DoctorProfile>;
}

/// Storage of encrypted records. Records are read-only after insert.
pub trait RecordStore: Send + Sync {
    fn insert(&self, record: MedicalRecord);
    fn get(&self, id: RecordId) -> Option<MedicalRecord>;
    fn records_for_patient(&self, patient_id: PatientId) -> Vec<MedicalRecord>;
    /// Records authored by a doctor, across all their patients.
    fn records_for_doctor(&self, doctor_id: DoctorId) -> Vec<MedicalRecord>;
}

/// The doctor-patient assignment relation.
///
/// Membership is keyed by the (doctor, patient) pair rather than loaded as
/// a per-doctor collection, so check-then-mutate is atomic under one write
/// lock and concurrent assignment changes cannot race a membership check.
pub trait AssignmentLinks: Send + Sync {
    /// Adds a link. Returns `false` if the pair was already assigned.
    fn assign(&self, doctor_id: DoctorId, patient_id: PatientId) -> bool;
    /// Removes a link. Returns `false` if the pair was not assigned.
    fn unassign(&self, doctor_id: DoctorId, patient_id: PatientId) -> bool;
    fn is_assigned(&self, doctor_id: DoctorId, patient_id: PatientId) -> bool;
}

/// In-memory patient directory.
#[derive(Default)]
pub struct InMemoryPatients {
    patients: RwLock<HashMap<PatientId, PatientProfile>>,
}

impl InMemoryPatients {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatientDirectory for InMemoryPatients {
    fn insert(&self, profile: PatientProfile) {
        self.patients.write().unwrap().insert(profile.id, profile);
    }

    fn get(&self, id: PatientId) -> Option<PatientProfile> {
        self.patients.read().unwrap().get(&id).cloned()
    }
}

/// In-memory doctor directory.
#[derive(Default)]
pub struct InMemoryDoctors {
    doctors: RwLock<HashMap<DoctorId, DoctorProfile>>,
}

impl InMemoryDoctors {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DoctorDirectory for InMemoryDoctors {
    fn insert(&self, profile: DoctorProfile) {
        self.doctors.write().unwrap().insert(profile.id, profile);
    }

    fn get(&self, id: DoctorId) -> Option<DoctorProfile> {
        self.doctors.read().unwrap().get(&id).cloned()
    }
}

/// In-memory record store.
#[derive(Default)]
pub struct InMemoryRecords {
    records: RwLock<HashMap<RecordId, MedicalRecord>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecords {
    fn insert(&self, record: MedicalRecord) {
        self.records.write().unwrap().insert(record.id, record);
    }

    fn get(&self, id: RecordId) -> Option<MedicalRecord> {
        self.records.read().unwrap().get(&id).cloned()
    }

    fn records_for_patient(&self, patient_id: PatientId) -> Vec<MedicalRecord> {
        let mut records: Vec<MedicalRecord> = self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    fn records_for_doctor(&self, doctor_id: DoctorId) -> Vec<MedicalRecord> {
        let mut records: Vec<MedicalRecord> = self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|r| r.doctor_id == Some(doctor_id))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

/// In-memory assignment relation.
#[derive(Default)]
pub struct InMemoryAssignments {
    links: RwLock<HashSet<(DoctorId, PatientId)>>,
}

impl InMemoryAssignments {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentLinks for InMemoryAssignments {
    fn assign(&self, doctor_id: DoctorId, patient_id: PatientId) -> bool {
        self.links.write().unwrap().insert((doctor_id, patient_id))
    }

    fn unassign(&self, doctor_id: DoctorId, patient_id: PatientId) -> bool {
        self.links.write().unwrap().remove(&(doctor_id, patient_id))
    }

    fn is_assigned(&self, doctor_id: DoctorId, patient_id: PatientId) -> bool {
        self.links.read().unwrap().contains(&(doctor_id, patient_id))
    }
}
