//! Persistence, backup and restore integration tests.

use clinic_desk_core::db::{Collection, Database};
use clinic_desk_core::desk::{ClinicDesk, TreatmentForm};
use clinic_desk_core::export::Snapshot;
use clinic_desk_core::models::{AppointmentForm, Patient, PatientForm, VitalSignsForm};
use clinic_desk_core::DeskError;
use tempfile::tempdir;

fn book(desk: &mut ClinicDesk, name: &str) -> i64 {
    let operator = match desk.list_operators().unwrap().first() {
        Some(op) => op.id,
        None => desk.create_operator("Dr. Sari", "Physiotherapist").unwrap().id,
    };
    let treatment = match desk.list_treatments().unwrap().first() {
        Some(t) => t.id,
        None => desk
            .create_treatment(TreatmentForm::new("Manual therapy", 150000))
            .unwrap()
            .id,
    };
    let patient = desk
        .create_patient(PatientForm::new(name, 45, "+1-555-0123"))
        .unwrap();
    desk.create_appointment(AppointmentForm {
        patient_id: patient.id,
        operator_id: operator,
        treatment_ids: vec![treatment],
        date: None,
        vital_signs: VitalSignsForm::default(),
    })
    .unwrap()
    .id
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    let record_number = {
        let mut desk = ClinicDesk::open(&path).unwrap();
        let appointment = book(&mut desk, "John Doe");
        desk.generate_invoice(appointment).unwrap();
        desk.list_patients().unwrap()[0].record_number.clone()
    };

    let desk = ClinicDesk::open(&path).unwrap();
    let patients = desk.list_patients().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].record_number, record_number);
    assert_eq!(desk.list_invoices().unwrap().len(), 1);
}

#[test]
fn test_ids_continue_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    let (first_log_id, first_patient) = {
        let mut desk = ClinicDesk::open(&path).unwrap();
        book(&mut desk, "John Doe");
        let newest = desk.activity_log().unwrap()[0].id;
        (newest, desk.list_patients().unwrap()[0].clone())
    };

    let mut desk = ClinicDesk::open(&path).unwrap();
    book(&mut desk, "Jane Smith");

    let log = desk.activity_log().unwrap();
    assert!(log[0].id > first_log_id);
    let ids: Vec<i64> = log.iter().map(|e| e.id).collect();
    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    let second = desk
        .list_patients()
        .unwrap()
        .into_iter()
        .find(|p| p.name == "Jane Smith")
        .unwrap();
    assert!(second.id > first_patient.id);
    assert_ne!(second.record_number, first_patient.record_number);
}

#[test]
fn test_deleted_ids_are_not_reused() {
    let mut desk = ClinicDesk::open_in_memory().unwrap();
    let first = desk
        .create_patient(PatientForm::new("John Doe", 45, "+1-555-0123"))
        .unwrap();
    desk.delete_patient(first.id).unwrap();

    let second = desk
        .create_patient(PatientForm::new("Jane Smith", 32, "+1-555-0199"))
        .unwrap();
    assert!(second.id > first.id);
    assert_ne!(second.record_number, first.record_number);
}

#[test]
fn test_backup_restores_into_fresh_desk() {
    let mut source = ClinicDesk::open_in_memory().unwrap();
    let appointment = book(&mut source, "John Doe");
    book(&mut source, "Jane Smith");
    source.generate_invoice(appointment).unwrap();
    let backup = source.export_backup().unwrap();

    let dir = tempdir().unwrap();
    let mut target = ClinicDesk::open(dir.path().join("restored.db")).unwrap();
    book(&mut target, "Someone Else");

    let summary = target.restore_backup(&backup).unwrap();
    assert_eq!(summary.patients, 2);
    assert_eq!(summary.appointments, 2);
    assert_eq!(summary.invoices, 1);

    let names: Vec<String> = target
        .list_patients()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["John Doe", "Jane Smith"]);

    // New records after a restore get IDs above the restored ones
    let next = book(&mut target, "Late Arrival");
    assert_eq!(next, 3);
    let ids: Vec<i64> = target.list_patients().unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_rejected_backup_changes_nothing() {
    let mut desk = ClinicDesk::open_in_memory().unwrap();
    book(&mut desk, "John Doe");

    let err = desk.restore_backup(r#"{"patients": []}"#).unwrap_err();
    assert!(matches!(err, DeskError::ValidationFailed(_)));
    let err = desk.restore_backup("not a backup").unwrap_err();
    assert!(matches!(err, DeskError::StorageCorrupt(_)));

    assert_eq!(desk.list_patients().unwrap().len(), 1);
}

#[test]
fn test_snapshot_checksum_matches_contents() {
    let db = Database::open_in_memory().unwrap();
    let patient = Patient {
        id: 1,
        record_number: "PT2025000001".into(),
        name: "John Doe".into(),
        age: 45,
        phone_number: "+1-555-0123".into(),
        address: None,
        initial_diagnosis: None,
        created_at: "2025-01-15T10:30:00.000Z".into(),
    };
    db.save(Collection::Patients, &[patient]).unwrap();

    let snapshot = Snapshot::capture(&db).unwrap();
    assert_eq!(
        snapshot.checksum.as_deref(),
        Some(snapshot.compute_checksum().unwrap().as_str())
    );
    assert!(snapshot.snapshot_id.is_some());
}
