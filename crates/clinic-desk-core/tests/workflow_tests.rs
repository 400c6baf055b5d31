//! Front-desk workflow integration tests.

use clinic_desk_core::desk::{ClinicDesk, TreatmentForm};
use clinic_desk_core::models::{AppointmentForm, InvoiceStatus, PatientForm, VitalSignsForm};
use clinic_desk_core::query::{InvoiceField, SortDirection};
use clinic_desk_core::reports::ReportFilter;
use clinic_desk_core::{linkify, DeskError, SpanKind};

struct Clinic {
    desk: ClinicDesk,
    operator_id: i64,
    therapy_id: i64,
    ultrasound_id: i64,
}

fn clinic() -> Clinic {
    let mut desk = ClinicDesk::open_in_memory().unwrap();
    desk.set_current_operator("Dr. Sari");
    let operator = desk.create_operator("Dr. Sari", "Physiotherapist").unwrap();
    let therapy = desk
        .create_treatment(TreatmentForm::new("Manual therapy", 150000))
        .unwrap();
    let ultrasound = desk
        .create_treatment(TreatmentForm::new("Ultrasound", 80000))
        .unwrap();

    Clinic {
        desk,
        operator_id: operator.id,
        therapy_id: therapy.id,
        ultrasound_id: ultrasound.id,
    }
}

fn visit(clinic: &Clinic, patient_id: i64, treatment_ids: Vec<i64>) -> AppointmentForm {
    AppointmentForm {
        patient_id,
        operator_id: clinic.operator_id,
        treatment_ids,
        date: None,
        vital_signs: VitalSignsForm {
            blood_pressure: Some("120/80".to_string()),
            heart_rate: Some(72),
            ..VitalSignsForm::default()
        },
    }
}

#[test]
fn test_patient_to_paid_invoice() {
    let mut c = clinic();

    let patient = c
        .desk
        .create_patient(PatientForm::new("John Doe", 45, "+1-555-0123"))
        .unwrap();
    assert!(patient.record_number.starts_with("PT"));
    assert_eq!(patient.record_number.len(), 12);

    let form = visit(&c, patient.id, vec![c.therapy_id]);
    let appointment = c.desk.create_appointment(form).unwrap();
    assert_eq!(appointment.patient_name, "John Doe");
    assert_eq!(appointment.total_price, 150000);

    let invoice = c.desk.generate_invoice(appointment.id).unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    assert_eq!(invoice.total_amount, 150000);
    assert!(invoice.invoice_number.starts_with("INV-"));
    assert!(invoice.updated_at.is_none());

    // Generating again hands back the same invoice
    let again = c.desk.generate_invoice(appointment.id).unwrap();
    assert_eq!(again.id, invoice.id);
    assert_eq!(c.desk.list_invoices().unwrap().len(), 1);

    let paid = c.desk.set_invoice_status(invoice.id, InvoiceStatus::Paid).unwrap();
    assert!(paid.updated_at.is_some());

    let stats = c.desk.dashboard().unwrap();
    assert_eq!(stats.total_patients, 1);
    assert_eq!(stats.appointments_this_month, 1);
    assert_eq!(stats.revenue_this_month, 150000);
    assert_eq!(stats.total_revenue, 150000);

    let actions: Vec<String> = c
        .desk
        .activity_log()
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            "marked invoice as paid for John Doe",
            "created an invoice from appointment of John Doe",
            "created a new appointment for John Doe",
            "created a new patient record",
        ]
    );
}

#[test]
fn test_invoice_notes_independent_of_appointment() {
    let mut c = clinic();
    let patient = c
        .desk
        .create_patient(PatientForm::new("Jane Smith", 32, "+1-555-0199"))
        .unwrap();
    let form = visit(&c, patient.id, vec![c.therapy_id, c.ultrasound_id]);
    let appointment = c.desk.create_appointment(form).unwrap();
    let invoice = c.desk.generate_invoice(appointment.id).unwrap();

    c.desk
        .update_invoice_treatment_notes(invoice.id, c.ultrasound_id, Some("Left knee".into()))
        .unwrap();

    let appointment = c.desk.get_appointment(appointment.id).unwrap();
    assert!(appointment.treatments.iter().all(|t| t.notes.is_none()));
    let invoice = c.desk.get_invoice(invoice.id).unwrap();
    assert_eq!(invoice.treatments[1].notes.as_deref(), Some("Left knee"));
}

#[test]
fn test_appointment_notes_do_not_reach_invoice() {
    let mut c = clinic();
    let patient = c
        .desk
        .create_patient(PatientForm::new("Jane Smith", 32, "+1-555-0199"))
        .unwrap();
    let form = visit(&c, patient.id, vec![c.therapy_id, c.ultrasound_id]);
    let appointment = c.desk.create_appointment(form).unwrap();
    let invoice = c.desk.generate_invoice(appointment.id).unwrap();

    c.desk
        .update_treatment_notes(appointment.id, c.therapy_id, Some("Neck and shoulders".into()))
        .unwrap();

    let stored = c.desk.get_invoice(invoice.id).unwrap();
    assert_eq!(stored.treatments, invoice.treatments);
    assert!(stored.treatments.iter().all(|t| t.notes.is_none()));
    let prices: i64 = stored.treatments.iter().map(|t| t.price).sum();
    assert_eq!(stored.total_amount, prices);
    assert_eq!(stored.total_amount, 230000);

    let appointment = c.desk.get_appointment(appointment.id).unwrap();
    assert_eq!(appointment.treatments[0].notes.as_deref(), Some("Neck and shoulders"));
}

#[test]
fn test_deleting_patient_keeps_history() {
    let mut c = clinic();
    let patient = c
        .desk
        .create_patient(PatientForm::new("Jane Smith", 32, "+1-555-0199"))
        .unwrap();
    let form = visit(&c, patient.id, vec![c.therapy_id]);
    let appointment = c.desk.create_appointment(form).unwrap();
    c.desk.generate_invoice(appointment.id).unwrap();

    let appointments = c.desk.list_appointments().unwrap();
    let invoices = c.desk.list_invoices().unwrap();

    c.desk.delete_patient(patient.id).unwrap();

    assert!(c.desk.list_patients().unwrap().is_empty());
    let kept_appointments = c.desk.list_appointments().unwrap();
    let kept_invoices = c.desk.list_invoices().unwrap();
    assert_eq!(kept_appointments, appointments);
    assert_eq!(kept_invoices, invoices);
    assert_eq!(kept_appointments[0].patient_id, patient.id);
    assert_eq!(kept_appointments[0].patient_name, "Jane Smith");
    assert_eq!(kept_invoices[0].patient_id, patient.id);
    assert_eq!(kept_invoices[0].patient_name, "Jane Smith");
}

#[test]
fn test_deleting_appointment_removes_invoice() {
    let mut c = clinic();
    let patient = c
        .desk
        .create_patient(PatientForm::new("Jane Smith", 32, "+1-555-0199"))
        .unwrap();
    let form = visit(&c, patient.id, vec![c.therapy_id]);
    let appointment = c.desk.create_appointment(form).unwrap();
    c.desk.generate_invoice(appointment.id).unwrap();

    c.desk.delete_appointment(appointment.id).unwrap();

    assert!(c.desk.list_invoices().unwrap().is_empty());
    assert!(matches!(
        c.desk.get_appointment(appointment.id),
        Err(DeskError::NotFound { .. })
    ));

    // Nothing in a delete entry is navigable
    let log = c.desk.activity_log().unwrap();
    let deleted = log
        .iter()
        .find(|e| e.action.starts_with("deleted appointment"))
        .unwrap();
    assert!(linkify(deleted).iter().all(|s| !s.linkable));
}

#[test]
fn test_appointment_log_links_patient() {
    let mut c = clinic();
    let patient = c
        .desk
        .create_patient(PatientForm::new("Jane Smith", 32, "+1-555-0199"))
        .unwrap();
    let form = visit(&c, patient.id, vec![c.therapy_id]);
    c.desk.create_appointment(form).unwrap();

    let log = c.desk.activity_log().unwrap();
    let spans = linkify(&log[0]);
    let patient_span = spans
        .iter()
        .find(|s| s.kind == SpanKind::PatientRef)
        .unwrap();
    assert_eq!(patient_span.value, "Jane Smith");
    assert!(patient_span.linkable);
}

#[test]
fn test_invoice_list_and_operator_report() {
    let mut c = clinic();
    for (name, treatments) in [
        ("Alice Brown", vec![c.therapy_id]),
        ("Bob Green", vec![c.ultrasound_id]),
        ("Carol White", vec![c.therapy_id, c.ultrasound_id]),
    ] {
        let patient = c
            .desk
            .create_patient(PatientForm::new(name, 40, "+1-555-0100"))
            .unwrap();
        let form = visit(&c, patient.id, treatments);
        let appointment = c.desk.create_appointment(form).unwrap();
        let invoice = c.desk.generate_invoice(appointment.id).unwrap();
        if name != "Bob Green" {
            c.desk.set_invoice_status(invoice.id, InvoiceStatus::Paid).unwrap();
        }
    }

    let params = c
        .desk
        .list_query::<InvoiceField>()
        .sort_by(InvoiceField::TotalAmount, SortDirection::Descending);
    let page = c.desk.query_invoices(&params).unwrap();
    let totals: Vec<i64> = page.items.iter().map(|i| i.total_amount).collect();
    assert_eq!(totals, vec![230000, 150000, 80000]);

    let searched = c.desk.query_invoices(&params.clone().search("bob")).unwrap();
    assert_eq!(searched.total_items, 1);

    let today = chrono::Utc::now();
    let filter = ReportFilter::year(chrono::Datelike::year(&today));
    let report = c.desk.operator_report(&filter).unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].appointment_count, 3);
    assert_eq!(report.rows[0].revenue, 380000);
    assert_eq!(c.desk.operator_invoices(c.operator_id, &filter).unwrap().len(), 3);
}

#[test]
fn test_validation_errors() {
    let mut c = clinic();

    let err = c
        .desk
        .create_patient(PatientForm::new("", 45, "+1-555-0123"))
        .unwrap_err();
    assert!(matches!(err, DeskError::ValidationFailed(_)));

    let err = c
        .desk
        .create_patient(PatientForm::new("John Doe", 0, "+1-555-0123"))
        .unwrap_err();
    assert!(matches!(err, DeskError::ValidationFailed(_)));

    let patient = c
        .desk
        .create_patient(PatientForm::new("John Doe", 45, "+1-555-0123"))
        .unwrap();
    let empty = visit(&c, patient.id, Vec::new());
    let err = c.desk.create_appointment(empty).unwrap_err();
    assert!(matches!(err, DeskError::ValidationFailed(_)));

    let unknown = visit(&c, 999, vec![c.therapy_id]);
    let err = c.desk.create_appointment(unknown).unwrap_err();
    assert!(matches!(err, DeskError::NotFound { .. }));

    // Failed operations leave no trace in the log
    assert_eq!(c.desk.activity_log().unwrap().len(), 1);
}
