//! Patient registration.

use chrono::{Datelike, Utc};
use tracing::info;

use super::{optional, position, required, ClinicDesk};
use crate::db::{Collection, RECORD_NUMBER_SEQUENCE};
use crate::error::{DeskError, DeskResult};
use crate::models::dates::now_timestamp;
use crate::models::{format_record_number, max_id, NewLogEntry, Patient, PatientForm, TargetType};

/// Checked and trimmed form fields.
struct ValidPatient {
    name: String,
    age: u32,
    phone_number: String,
    address: Option<String>,
    initial_diagnosis: Option<String>,
}

fn validate(form: PatientForm) -> DeskResult<ValidPatient> {
    let name = required(&form.name, "Patient name is required")?;
    if form.age == 0 {
        return Err(DeskError::invalid("Age must be greater than 0"));
    }

    Ok(ValidPatient {
        name,
        age: form.age,
        phone_number: form.phone_number.trim().to_string(),
        address: optional(form.address),
        initial_diagnosis: optional(form.initial_diagnosis),
    })
}

/// Largest sequence part among stored record numbers (`PT` + year + seq).
fn record_number_floor(patients: &[Patient]) -> i64 {
    patients
        .iter()
        .filter_map(|p| p.record_number.strip_prefix("PT"))
        .filter_map(|rest| rest.get(4..))
        .filter_map(|seq| seq.parse::<i64>().ok())
        .max()
        .unwrap_or(0)
}

fn patient_entry(action: &str, patient: &Patient) -> NewLogEntry {
    NewLogEntry::new(action, TargetType::Patient)
        .target(patient.id)
        .target_name(&patient.name)
        .patient(patient.id, &patient.name)
}

impl ClinicDesk {
    /// Register a patient and assign its ID and record number.
    pub fn create_patient(&mut self, form: PatientForm) -> DeskResult<Patient> {
        let valid = validate(form)?;
        let mut patients: Vec<Patient> = self.db.load(Collection::Patients)?;

        let id = self.db.next_id(Collection::Patients, max_id(&patients))?;
        let seq = self
            .db
            .next_sequence(RECORD_NUMBER_SEQUENCE, record_number_floor(&patients))?;

        let patient = Patient {
            id,
            record_number: format_record_number(Utc::now().year(), seq),
            name: valid.name,
            age: valid.age,
            phone_number: valid.phone_number,
            address: valid.address,
            initial_diagnosis: valid.initial_diagnosis,
            created_at: now_timestamp(),
        };

        patients.push(patient.clone());
        self.db.save(Collection::Patients, &patients)?;
        info!(id, record_number = %patient.record_number, "Patient created");

        self.record_activity(patient_entry("created a new patient record", &patient))?;
        Ok(patient)
    }

    /// Replace a patient's editable fields. ID, record number and creation
    /// time are kept.
    ///
    /// Names already copied onto appointments and invoices are not changed.
    pub fn update_patient(&mut self, id: i64, form: PatientForm) -> DeskResult<Patient> {
        let valid = validate(form)?;
        let mut patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        let index = position(&patients, "Patient", id)?;

        let patient = &mut patients[index];
        patient.name = valid.name;
        patient.age = valid.age;
        patient.phone_number = valid.phone_number;
        patient.address = valid.address;
        patient.initial_diagnosis = valid.initial_diagnosis;
        let updated = patient.clone();

        self.db.save(Collection::Patients, &patients)?;
        info!(id, "Patient updated");

        self.record_activity(patient_entry("updated patient information", &updated))?;
        Ok(updated)
    }

    /// Remove a patient. Their appointments and invoices are left in place.
    pub fn delete_patient(&mut self, id: i64) -> DeskResult<Patient> {
        let mut patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        let index = position(&patients, "Patient", id)?;

        self.record_activity(patient_entry("deleted patient record", &patients[index]))?;

        let removed = patients.remove(index);
        self.db.save(Collection::Patients, &patients)?;
        info!(id, "Patient deleted");
        Ok(removed)
    }

    pub fn get_patient(&self, id: i64) -> DeskResult<Patient> {
        let patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        let index = position(&patients, "Patient", id)?;
        Ok(patients[index].clone())
    }

    pub fn list_patients(&self) -> DeskResult<Vec<Patient>> {
        Ok(self.db.load(Collection::Patients)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ClinicDesk {
        ClinicDesk::open_in_memory().unwrap()
    }

    fn john() -> PatientForm {
        PatientForm {
            address: Some("123 Main St".into()),
            initial_diagnosis: Some("Low back pain".into()),
            ..PatientForm::new("John Doe", 45, "+1-555-0123")
        }
    }

    #[test]
    fn test_create_assigns_id_and_record_number() {
        let mut desk = setup();
        let first = desk.create_patient(john()).unwrap();
        let second = desk.create_patient(PatientForm::new("Jane Smith", 30, "0812")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        let year = Utc::now().year();
        assert_eq!(first.record_number, format_record_number(year, 1));
        assert_eq!(second.record_number, format_record_number(year, 2));
        assert!(!first.created_at.is_empty());
    }

    #[test]
    fn test_create_logs_entry() {
        let mut desk = setup();
        let patient = desk.create_patient(john()).unwrap();

        let entries = desk.activity_log().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "created a new patient record");
        assert_eq!(entries[0].patient_id, Some(patient.id));
        assert_eq!(entries[0].target_name.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_validation() {
        let mut desk = setup();
        let err = desk.create_patient(PatientForm::new("John", 0, "0812")).unwrap_err();
        assert!(matches!(err, DeskError::ValidationFailed(_)));

        let err = desk.create_patient(PatientForm::new("  ", 30, "0812")).unwrap_err();
        assert!(matches!(err, DeskError::ValidationFailed(_)));

        assert!(desk.list_patients().unwrap().is_empty());
        assert!(desk.activity_log().unwrap().is_empty());
    }

    #[test]
    fn test_phone_number_is_optional() {
        let mut desk = setup();
        let blank = desk.create_patient(PatientForm::new("John", 30, "   ")).unwrap();
        assert_eq!(blank.phone_number, "");

        let padded = desk
            .create_patient(PatientForm::new("Jane", 30, " +1-555-0199 "))
            .unwrap();
        assert_eq!(padded.phone_number, "+1-555-0199");
        assert_eq!(desk.list_patients().unwrap().len(), 2);
    }

    #[test]
    fn test_update_keeps_identity() {
        let mut desk = setup();
        let created = desk.create_patient(john()).unwrap();

        let updated = desk
            .update_patient(created.id, PatientForm::new("John A. Doe", 46, "+1-555-0199"))
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.record_number, created.record_number);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.name, "John A. Doe");
        assert_eq!(updated.address, None);
        assert_eq!(desk.activity_log().unwrap()[0].action, "updated patient information");
    }

    #[test]
    fn test_unknown_patient() {
        let mut desk = setup();
        assert!(matches!(
            desk.update_patient(99, john()).unwrap_err(),
            DeskError::NotFound { entity: "Patient", id: 99 }
        ));
        assert!(matches!(
            desk.delete_patient(99).unwrap_err(),
            DeskError::NotFound { .. }
        ));
        assert!(desk.get_patient(99).is_err());
    }

    #[test]
    fn test_delete_logs_before_removal() {
        let mut desk = setup();
        let patient = desk.create_patient(john()).unwrap();

        let removed = desk.delete_patient(patient.id).unwrap();
        assert_eq!(removed.id, patient.id);
        assert!(desk.list_patients().unwrap().is_empty());

        let entry = &desk.activity_log().unwrap()[0];
        assert_eq!(entry.action, "deleted patient record");
        assert_eq!(entry.patient_name.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut desk = setup();
        let first = desk.create_patient(john()).unwrap();
        desk.delete_patient(first.id).unwrap();

        let second = desk.create_patient(john()).unwrap();
        assert!(second.id > first.id);
        assert_ne!(second.record_number, first.record_number);
    }

    #[test]
    fn test_record_number_floor_reads_legacy_numbers() {
        let legacy = Patient {
            id: 1736935800000,
            record_number: "PT202500041".into(),
            name: "Legacy".into(),
            age: 50,
            phone_number: "0812".into(),
            address: None,
            initial_diagnosis: None,
            created_at: String::new(),
        };
        assert_eq!(record_number_floor(&[legacy]), 41);
        assert_eq!(record_number_floor(&[]), 0);
    }
}
