//! Authorization for record decryption and listing.
//!
//! Stateless predicates with no side effects. Decrypt and list share the
//! assignment lookup but differ on denial: the decrypt path raises a typed
//! error at the service, the list path yields an empty collection. Both
//! behaviors are caller contracts and are kept distinct.

use std::sync::Arc;

use crate::directory::AssignmentLinks;
use crate::model::{PatientId, Requester};

/// Decides who may decrypt or list a patient's records.
pub struct AccessGate {
    assignments: Arc<dyn AssignmentLinks>,
}

impl AccessGate {
    pub fn new(assignments: Arc<dyn AssignmentLinks>) -> Self {
        Self { assignments }
    }

    /// Whether `requester` may decrypt records owned by `owner`.
    ///
    /// Allowed for the owning patient and for doctors with an assignment
    /// link to that patient. Administrators are not allowed: listing
    /// metadata is an administrative function, reading plaintext is not.
    pub fn may_decrypt(&self, requester: Requester, owner: PatientId) -> bool {
        match requester {
            Requester::Patient(patient_id) => patient_id == owner,
            Requester::Doctor(doctor_id) => self.assignments.is_assigned(doctor_id, owner),
            Requester::Admin => false,
        }
    }

    /// Whether `requester` may list metadata of records owned by `owner`.
    pub fn may_list(&self, requester: Requester, owner: PatientId) -> bool {
        match requester {
            Requester::Admin => true,
            _ => self.may_decrypt(requester, owner),
        }
    }
}
