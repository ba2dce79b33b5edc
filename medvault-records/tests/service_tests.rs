use std::sync::Arc;

use pretty_assertions::assert_eq;

use medvault_records::{
    AssignmentOutcome, InMemoryAssignments, InMemoryDoctors, InMemoryPatients, InMemoryRecords,
    RecordError, RecordService, RecordUpload, Requester,
};

fn service() -> RecordService {
    RecordService::new(
        Arc::new(InMemoryPatients::new()),
        Arc::new(InMemoryDoctors::new()),
        Arc::new(InMemoryRecords::new()),
        Arc::new(InMemoryAssignments::new()),
    )
}

fn upload(content: Vec<u8>) -> RecordUpload {
    RecordUpload {
        record_type: "LAB_RESULT".into(),
        file_name: "cbc-panel.pdf".into(),
        content_type: "application/pdf".into(),
        encrypted_content: content,
    }
}

// ── Registration ─────────────────────────────────────────────────

#[test]
fn registration_provisions_envelope() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();

    let envelope = svc.patient_envelope(alice).unwrap();
    assert_eq!(envelope.wrapped_data_key.len(), 48); // 32-byte key + 16-byte tag
    assert_eq!(envelope.nonce.len(), 12);
    assert!(envelope.salt.is_some());
}

#[test]
fn envelope_lookup_for_unknown_patient_fails() {
    let svc = service();
    let ghost = medvault_records::PatientId::new();
    let result = svc.patient_envelope(ghost);
    assert!(matches!(result, Err(RecordError::PatientProfileNotFound(_))));
}

// ── End-to-end decrypt scenario ──────────────────────────────────

#[test]
fn register_upload_decrypt_roundtrip() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();

    let plaintext = b"hemoglobin 13.1 g/dL";
    let ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", plaintext)
        .unwrap();
    assert_ne!(ciphertext, plaintext);

    let record = svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    let recovered = svc
        .decrypt_record(record, "S3cret!", Requester::Patient(alice))
        .unwrap();
    assert_eq!(recovered, plaintext);
}

#[test]
fn wrong_password_surfaces_before_content_decryption() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", b"notes")
        .unwrap();
    let record = svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    let result = svc.decrypt_record(record, "wrong", Requester::Patient(alice));
    assert!(matches!(result, Err(RecordError::WrongPassword)));
}

#[test]
fn tampered_content_is_not_wrong_password() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let mut ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", b"notes")
        .unwrap();
    ciphertext[0] ^= 0xFF;
    let record = svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    // The password was right and the key unwrapped; the record itself fails
    // tag verification
    let result = svc.decrypt_record(record, "S3cret!", Requester::Patient(alice));
    assert!(matches!(result, Err(RecordError::Crypto(_))));
}

#[test]
fn decrypt_unknown_record_fails() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let ghost = medvault_records::RecordId::new();

    let result = svc.decrypt_record(ghost, "S3cret!", Requester::Patient(alice));
    assert!(matches!(result, Err(RecordError::RecordNotFound(_))));
}

#[test]
fn encrypt_content_rejects_wrong_password() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();

    let result = svc.encrypt_record_content(alice, "wrong", b"notes");
    assert!(matches!(result, Err(RecordError::WrongPassword)));
}

// ── Authorization table ──────────────────────────────────────────

#[test]
fn authorization_table_for_decrypt() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let dana = svc
        .register_patient("dana", "0therPw!", None, None, None)
        .unwrap();
    let bob = svc.register_doctor("dr-bob", None, None).unwrap();
    let carol = svc.register_doctor("dr-carol", None, None).unwrap();

    svc.assign_patient(bob, alice).unwrap();

    let ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", b"immunization history")
        .unwrap();
    let record = svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    // Owning patient: allow
    assert!(svc
        .decrypt_record(record, "S3cret!", Requester::Patient(alice))
        .is_ok());

    // Assigned doctor Bob: allow (decrypting with the patient's password)
    assert!(svc
        .decrypt_record(record, "S3cret!", Requester::Doctor(bob))
        .is_ok());

    // Unassigned doctor Carol: deny
    assert!(matches!(
        svc.decrypt_record(record, "S3cret!", Requester::Doctor(carol)),
        Err(RecordError::AccessDenied)
    ));

    // Unrelated patient Dana: deny
    assert!(matches!(
        svc.decrypt_record(record, "S3cret!", Requester::Patient(dana)),
        Err(RecordError::AccessDenied)
    ));

    // Admin: may list, never decrypt
    assert!(matches!(
        svc.decrypt_record(record, "S3cret!", Requester::Admin),
        Err(RecordError::AccessDenied)
    ));
}

#[test]
fn unassignment_revokes_decrypt_access() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let bob = svc.register_doctor("dr-bob", None, None).unwrap();
    svc.assign_patient(bob, alice).unwrap();

    let ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", b"notes")
        .unwrap();
    let record = svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    assert!(svc
        .decrypt_record(record, "S3cret!", Requester::Doctor(bob))
        .is_ok());

    svc.unassign_patient(bob, alice).unwrap();
    assert!(matches!(
        svc.decrypt_record(record, "S3cret!", Requester::Doctor(bob)),
        Err(RecordError::AccessDenied)
    ));
}

// ── List asymmetry ───────────────────────────────────────────────

#[test]
fn denied_list_returns_empty_not_error() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let dana = svc
        .register_patient("dana", "0therPw!", None, None, None)
        .unwrap();
    let carol = svc.register_doctor("dr-carol", None, None).unwrap();

    let ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", b"notes")
        .unwrap();
    svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    // Owning patient sees the record
    assert_eq!(svc.list_patient_records(alice, Requester::Patient(alice)).len(), 1);
    // Admin may list
    assert_eq!(svc.list_patient_records(alice, Requester::Admin).len(), 1);
    // Unassigned doctor and unrelated patient get empty collections
    assert!(svc.list_patient_records(alice, Requester::Doctor(carol)).is_empty());
    assert!(svc.list_patient_records(alice, Requester::Patient(dana)).is_empty());
}

#[test]
fn list_for_unknown_patient_is_empty() {
    let svc = service();
    let ghost = medvault_records::PatientId::new();
    assert!(svc.list_patient_records(ghost, Requester::Admin).is_empty());
}

#[test]
fn list_summaries_never_expose_content() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", b"notes")
        .unwrap();
    svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    let summaries = svc.list_patient_records(alice, Requester::Patient(alice));
    let json = serde_json::to_value(&summaries).unwrap();
    assert!(json[0].get("encrypted_content").is_none());
    assert_eq!(json[0]["file_name"], "cbc-panel.pdf");
}

// ── Doctor uploads and listings ──────────────────────────────────

#[test]
fn doctor_upload_records_the_author() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let bob = svc.register_doctor("dr-bob", None, None).unwrap();
    svc.assign_patient(bob, alice).unwrap();

    let ciphertext = svc
        .encrypt_record_content(alice, "S3cret!", b"prescription")
        .unwrap();
    let record = svc
        .upload_record(alice, Some(bob), upload(ciphertext))
        .unwrap();

    let authored = svc.list_doctor_records(bob);
    assert_eq!(authored.len(), 1);
    assert_eq!(authored[0].id, record);
    assert_eq!(authored[0].doctor_id, Some(bob));
    assert_eq!(authored[0].patient_id, alice);
}

#[test]
fn upload_for_unknown_patient_fails() {
    let svc = service();
    let ghost = medvault_records::PatientId::new();
    let result = svc.upload_record(ghost, None, upload(vec![0u8; 32]));
    assert!(matches!(result, Err(RecordError::PatientProfileNotFound(_))));
}

// ── Legacy derivation mode ───────────────────────────────────────

#[test]
fn saltless_patient_decrypts_via_legacy_derivation() {
    use medvault_crypto::{
        derive_key_legacy, generate_nonce, wrap_data_key, DataKey, KeyEnvelope,
    };
    use medvault_records::{PatientDirectory, PatientId, PatientProfile};

    let patients = Arc::new(InMemoryPatients::new());
    let svc = RecordService::new(
        patients.clone(),
        Arc::new(InMemoryDoctors::new()),
        Arc::new(InMemoryRecords::new()),
        Arc::new(InMemoryAssignments::new()),
    );

    // A pre-salting account: wrapped under the fixed legacy salt, no salt stored
    let data_key = DataKey::generate();
    let nonce = generate_nonce();
    let password_key = derive_key_legacy("old-password");
    let wrapped = wrap_data_key(&data_key, &password_key, &nonce).unwrap();

    let alice = PatientId::new();
    patients.insert(PatientProfile {
        id: alice,
        username: "alice".into(),
        envelope: KeyEnvelope {
            wrapped_data_key: wrapped,
            nonce,
            salt: None,
        },
        date_of_birth: None,
        contact_number: None,
        address: None,
        registered_at: chrono::Utc::now(),
    });

    let plaintext = b"1998 appendectomy, no complications";
    let ciphertext = svc
        .encrypt_record_content(alice, "old-password", plaintext)
        .unwrap();
    let record = svc.upload_record(alice, None, upload(ciphertext)).unwrap();

    let recovered = svc
        .decrypt_record(record, "old-password", Requester::Patient(alice))
        .unwrap();
    assert_eq!(recovered, plaintext);

    let result = svc.decrypt_record(record, "new-password", Requester::Patient(alice));
    assert!(matches!(result, Err(RecordError::WrongPassword)));
}

// ── Assignment semantics ─────────────────────────────────────────

#[test]
fn repeated_assignment_is_reported_not_errored() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let bob = svc.register_doctor("dr-bob", None, None).unwrap();

    assert_eq!(svc.assign_patient(bob, alice).unwrap(), AssignmentOutcome::Applied);
    assert_eq!(svc.assign_patient(bob, alice).unwrap(), AssignmentOutcome::Unchanged);

    assert_eq!(svc.unassign_patient(bob, alice).unwrap(), AssignmentOutcome::Applied);
    assert_eq!(svc.unassign_patient(bob, alice).unwrap(), AssignmentOutcome::Unchanged);
}

#[test]
fn assignment_requires_both_profiles() {
    let svc = service();
    let alice = svc
        .register_patient("alice", "S3cret!", None, None, None)
        .unwrap();
    let bob = svc.register_doctor("dr-bob", None, None).unwrap();

    let ghost_doctor = medvault_records::DoctorId::new();
    let ghost_patient = medvault_records::PatientId::new();

    assert!(matches!(
        svc.assign_patient(ghost_doctor, alice),
        Err(RecordError::DoctorProfileNotFound(_))
    ));
    assert!(matches!(
        svc.assign_patient(bob, ghost_patient),
        Err(RecordError::PatientProfileNotFound(_))
    ));
}
