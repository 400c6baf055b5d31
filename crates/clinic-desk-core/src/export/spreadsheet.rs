//! Spreadsheet (CSV) export of the patient register and invoices.

use super::receipt::format_amount;
use crate::models::dates::parse_timestamp;
use crate::models::{Invoice, Patient, NOT_RECORDED};

const PATIENT_COLUMNS: [&str; 7] = [
    "Record Number",
    "Name",
    "Age",
    "Address",
    "Phone Number",
    "Initial Diagnosis",
    "Created At",
];

const INVOICE_COLUMNS: [&str; 14] = [
    "Invoice Number",
    "Patient Name",
    "Operator Name",
    "Date & Time",
    "Appointment Date",
    "Total Amount",
    "Status",
    "Vital Signs - BP",
    "Vital Signs - RR",
    "Vital Signs - HR",
    "Vital Signs - Borg",
    "Treatments Count",
    "Treatments List",
    "Created At",
];

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn push_row(csv: &mut String, cells: &[String]) {
    let line = cells
        .iter()
        .map(|c| escape_csv(c))
        .collect::<Vec<_>>()
        .join(",");
    csv.push_str(&line);
    csv.push('\n');
}

fn header(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

fn date_time(value: &str) -> String {
    parse_timestamp(value)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Readings of 0 are "not recorded" and export as empty cells.
fn reading(value: u32) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

/// Patient register as CSV, one row per patient.
pub fn patients_csv(patients: &[Patient]) -> String {
    let mut csv = String::new();
    push_row(&mut csv, &header(&PATIENT_COLUMNS));

    for p in patients {
        push_row(
            &mut csv,
            &[
                p.record_number.clone(),
                p.name.clone(),
                p.age.to_string(),
                p.address.clone().unwrap_or_default(),
                p.phone_number.clone(),
                p.initial_diagnosis.clone().unwrap_or_default(),
                date_time(&p.created_at),
            ],
        );
    }
    csv
}

/// Invoices as CSV, one row per invoice.
pub fn invoices_csv(invoices: &[Invoice]) -> String {
    let mut csv = String::new();
    push_row(&mut csv, &header(&INVOICE_COLUMNS));

    for inv in invoices {
        let treatments = inv
            .treatments
            .iter()
            .map(|t| format!("{} (Rp {})", t.name, format_amount(t.price)))
            .collect::<Vec<_>>()
            .join(", ");
        let blood_pressure = if inv.vital_signs.blood_pressure == NOT_RECORDED {
            String::new()
        } else {
            inv.vital_signs.blood_pressure.clone()
        };

        push_row(
            &mut csv,
            &[
                inv.invoice_number.clone(),
                inv.patient_name.clone(),
                inv.operator_name.clone(),
                date_time(&inv.date),
                inv.appointment_date.clone(),
                inv.total_amount.to_string(),
                inv.status.to_string(),
                blood_pressure,
                reading(inv.vital_signs.respiration_rate),
                reading(inv.vital_signs.heart_rate),
                reading(inv.vital_signs.borg_scale),
                inv.treatments.len().to_string(),
                treatments,
                date_time(&inv.created_at),
            ],
        );
    }
    csv
}
