//! Queryable record types.

use serde::{Deserialize, Serialize};

use super::{Queryable, SortKey};
use crate::models::dates::epoch_millis;
use crate::models::{Appointment, Invoice, Patient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientField {
    RecordNumber,
    Name,
    Age,
    Phone,
    Address,
    CreatedAt,
}

impl Queryable for Patient {
    type Field = PatientField;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.name.as_str(),
            self.record_number.as_str(),
            self.phone_number.as_str(),
        ];
        if let Some(address) = &self.address {
            fields.push(address);
        }
        fields
    }

    fn range_date(&self) -> &str {
        &self.created_at
    }

    fn sort_key(&self, field: PatientField) -> SortKey {
        match field {
            PatientField::RecordNumber => SortKey::Text(self.record_number.clone()),
            PatientField::Name => SortKey::Text(self.name.clone()),
            PatientField::Age => SortKey::Number(i64::from(self.age)),
            PatientField::Phone => SortKey::Text(self.phone_number.clone()),
            PatientField::Address => SortKey::Text(self.address.clone().unwrap_or_default()),
            PatientField::CreatedAt => SortKey::Date(epoch_millis(&self.created_at)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentField {
    Date,
    PatientName,
    OperatorName,
    TotalPrice,
    CreatedAt,
}

impl Queryable for Appointment {
    type Field = AppointmentField;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.patient_name.as_str()]
    }

    fn range_date(&self) -> &str {
        &self.date
    }

    fn sort_key(&self, field: AppointmentField) -> SortKey {
        match field {
            AppointmentField::Date => SortKey::Date(epoch_millis(&self.date)),
            AppointmentField::PatientName => SortKey::Text(self.patient_name.clone()),
            AppointmentField::OperatorName => SortKey::Text(self.operator_name.clone()),
            AppointmentField::TotalPrice => SortKey::Number(self.total_price),
            AppointmentField::CreatedAt => SortKey::Date(epoch_millis(&self.created_at)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceField {
    Date,
    InvoiceNumber,
    PatientName,
    TotalAmount,
    Status,
    CreatedAt,
}

impl Queryable for Invoice {
    type Field = InvoiceField;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.invoice_number.as_str(), self.patient_name.as_str()]
    }

    fn range_date(&self) -> &str {
        &self.date
    }

    fn sort_key(&self, field: InvoiceField) -> SortKey {
        match field {
            InvoiceField::Date => SortKey::Date(epoch_millis(&self.date)),
            InvoiceField::InvoiceNumber => SortKey::Text(self.invoice_number.clone()),
            InvoiceField::PatientName => SortKey::Text(self.patient_name.clone()),
            InvoiceField::TotalAmount => SortKey::Number(self.total_amount),
            InvoiceField::Status => SortKey::Text(self.status.as_str().to_string()),
            InvoiceField::CreatedAt => SortKey::Date(epoch_millis(&self.created_at)),
        }
    }
}

/// Patient picker for the vital-sign report.
///
/// Matches name or record number. A blank term returns nothing rather than
/// the whole register.
pub fn search_patients_for_report<'a>(
    patients: &'a [Patient],
    term: &str,
    limit: usize,
) -> Vec<&'a Patient> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    patients
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.record_number.to_lowercase().contains(&needle)
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceStatus, VitalSigns};
    use crate::query::{query, ListQuery, SortDirection};

    fn patient(id: i64, name: &str, age: u32, address: Option<&str>) -> Patient {
        Patient {
            id,
            record_number: format!("PT2025{:06}", id),
            name: name.into(),
            age,
            phone_number: format!("0812-{}", id),
            address: address.map(String::from),
            initial_diagnosis: None,
            created_at: format!("2025-01-{:02}T09:00:00.000Z", id),
        }
    }

    fn invoice(id: i64, patient_name: &str, amount: i64, date: &str) -> Invoice {
        Invoice {
            id,
            invoice_number: format!("INV-202501-{:04}", id),
            appointment_id: id,
            patient_id: id,
            patient_name: patient_name.into(),
            operator_id: 1,
            operator_name: "Dr. Sari".into(),
            date: date.into(),
            appointment_date: "2025-01-01".into(),
            vital_signs: VitalSigns::default(),
            treatments: Vec::new(),
            total_amount: amount,
            status: InvoiceStatus::Unpaid,
            created_at: date.into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_patient_search_fields() {
        let patients = vec![
            patient(1, "John Doe", 45, Some("Jl. Merdeka 1")),
            patient(2, "Jane Smith", 30, None),
        ];

        let by_address = query(&patients, &ListQuery::new(10).search("merdeka"));
        assert_eq!(by_address.items[0].id, 1);

        let by_record = query(&patients, &ListQuery::new(10).search("pt2025000002"));
        assert_eq!(by_record.items[0].id, 2);

        let by_phone = query(&patients, &ListQuery::new(10).search("0812-1"));
        assert_eq!(by_phone.total_items, 1);
    }

    #[test]
    fn test_patient_sort_by_age() {
        let patients = vec![
            patient(1, "A", 45, None),
            patient(2, "B", 30, None),
            patient(3, "C", 45, None),
        ];
        let page = query(
            &patients,
            &ListQuery::new(10).sort_by(PatientField::Age, SortDirection::Descending),
        );
        let ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_missing_address_sorts_first() {
        let patients = vec![patient(1, "A", 45, Some("Bandung")), patient(2, "B", 30, None)];
        let page = query(
            &patients,
            &ListQuery::new(10).sort_by(PatientField::Address, SortDirection::Ascending),
        );
        assert_eq!(page.items[0].id, 2);
    }

    #[test]
    fn test_invoice_search_and_date_sort() {
        let invoices = vec![
            invoice(1, "John Doe", 100, "2025-01-20T10:00:00.000Z"),
            invoice(2, "Jane Smith", 200, "2025-01-05T10:00:00.000Z"),
            invoice(3, "John Doe", 300, "2025-01-10T10:00:00.000Z"),
        ];

        let page = query(
            &invoices,
            &ListQuery::new(10)
                .search("john")
                .sort_by(InvoiceField::Date, SortDirection::Descending),
        );
        let ids: Vec<i64> = page.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let by_number = query(&invoices, &ListQuery::new(10).search("inv-202501-0002"));
        assert_eq!(by_number.items[0].id, 2);
    }

    #[test]
    fn test_report_patient_search() {
        let patients: Vec<Patient> = (1..=60).map(|i| patient(i, "Budi", 40, None)).collect();

        assert!(search_patients_for_report(&patients, "  ", 50).is_empty());
        assert_eq!(search_patients_for_report(&patients, "budi", 50).len(), 50);
        assert_eq!(search_patients_for_report(&patients, "PT2025000007", 50).len(), 1);
    }
}
