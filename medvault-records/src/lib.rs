//! Patient records, doctor assignments, and access-gated decryption.
//!
//! This crate composes the crypto core into the record workflow:
//! registration provisions a key envelope, uploads store ciphertext, and a
//! decrypt request runs access gate -> key unwrap -> content decrypt,
//! returning plaintext exactly once and never persisting it.
//!
//! Persistence is an external collaborator; the directories here are trait
//! seams with in-memory reference implementations.

mod access;
mod directory;
mod error;
mod model;
mod service;

pub use access::AccessGate;
pub use directory::{
    AssignmentLinks, InMemoryAssignments, InMemoryDoctors, InMemoryPatients, InMemoryRecords,
    DoctorDirectory, PatientDirectory, RecordStore,
};
pub use error::{RecordError, RecordResult};
pub use model::{
    DoctorId, DoctorProfile, MedicalRecord, PatientId, PatientProfile, RecordId, RecordSummary,
    RecordUpload, Requester,
};
pub use service::{AssignmentOutcome, RecordService};
