//! Printable treatment receipt.

use serde::{Deserialize, Serialize};

use crate::db::{setting_keys, Database, DbResult};
use crate::error::{DeskError, DeskResult};
use crate::models::dates::parse_timestamp;
use crate::models::{Invoice, Patient};

const DEFAULT_HEADER: &str = "BSP CENTER PHYSIOTHERAPY CLINIC\n\
Ruko Rose Garden 7 No.11, JakaSetia, Bekasi Selatan 17148";

const DEFAULT_FOOTER: &str = "Thank you for your visit!\n\
Semoga kesehatan selalu menyertai anda";

const RULE_WIDTH: usize = 50;

/// Clinic text printed above and below every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptConfig {
    pub header: String,
    pub footer: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

impl ReceiptConfig {
    pub fn validate(&self) -> DeskResult<()> {
        if self.header.trim().is_empty() {
            return Err(DeskError::invalid("Receipt header cannot be empty"));
        }
        if self.footer.trim().is_empty() {
            return Err(DeskError::invalid("Receipt footer cannot be empty"));
        }
        Ok(())
    }

    /// Stored configuration, or the defaults.
    pub fn load(db: &Database) -> DbResult<Self> {
        Ok(db
            .load_value::<ReceiptConfig>(setting_keys::RECEIPT_CONFIG)?
            .unwrap_or_default())
    }

    pub fn save(&self, db: &Database) -> DeskResult<()> {
        self.validate()?;
        db.save_value(setting_keys::RECEIPT_CONFIG, self)?;
        Ok(())
    }
}

/// Format an amount with dots between thousands (`150000` → `150.000`).
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `dd/mm/yyyy HH:MM` in UTC, or the raw text when it does not parse.
fn format_print_date(value: &str) -> String {
    parse_timestamp(value)
        .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Render the plain-text receipt for an invoice.
///
/// `patient` supplies the record number and address; both print a
/// placeholder when the patient record is gone.
pub fn render_receipt(invoice: &Invoice, patient: Option<&Patient>, config: &ReceiptConfig) -> String {
    let rule = "═".repeat(RULE_WIDTH);

    let treatments = invoice
        .treatments
        .iter()
        .map(|t| {
            let mut line = format!("- {}", t.name.to_uppercase());
            if t.price != 0 {
                line.push_str(&format!(" - RP {}", format_amount(t.price)));
            }
            if let Some(notes) = t.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                line.push_str(&format!("\n  Notes: {}", notes));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n");

    let record_number = patient.map_or("N/A", |p| p.record_number.as_str());
    let address = patient
        .and_then(|p| p.address.as_deref())
        .unwrap_or("No address recorded");

    let mut out = String::new();
    out.push_str(config.header.trim_end());
    out.push_str("\n\nTREATMENT RECEIPT\n\n");
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("DATE: {}\n", format_print_date(&invoice.date)));
    out.push_str(&format!("RECORD NUMBER: {}\n", record_number));
    out.push_str(&format!("Patient Name: {}\n", invoice.patient_name));
    out.push_str(&format!("Address: {}\n", address));
    out.push_str(&rule);
    out.push_str("\n\nTREATMENTS:\n");
    out.push_str(&treatments);
    out.push_str("\n\n");
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("TOTAL: RP {}\n\n", format_amount(invoice.total_amount)));
    out.push_str(&format!("INVOICE NUMBER: {}\n", invoice.invoice_number));
    out.push_str(&format!("OPERATOR: {}\n", invoice.operator_name));
    out.push_str(&format!("STATUS: {}\n\n", invoice.status.as_str().to_uppercase()));
    out.push_str(&rule);
    out.push_str("\n\n");
    out.push_str(config.footer.trim_end());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentTreatment, InvoiceStatus, VitalSigns};

    fn invoice() -> Invoice {
        Invoice {
            id: 1,
            invoice_number: "INV-202501-0001".into(),
            appointment_id: 1,
            patient_id: 1,
            patient_name: "John Doe".into(),
            operator_id: 2,
            operator_name: "Dr. Sari".into(),
            date: "2025-01-15T10:31:40.000Z".into(),
            appointment_date: "2025-01-15".into(),
            vital_signs: VitalSigns::default(),
            treatments: vec![
                AppointmentTreatment {
                    id: 7,
                    name: "Manual therapy".into(),
                    price: 150000,
                    notes: Some("Lumbar region".into()),
                },
                AppointmentTreatment {
                    id: 8,
                    name: "Ultrasound".into(),
                    price: 1250000,
                    notes: Some("  ".into()),
                },
            ],
            total_amount: 1400000,
            status: InvoiceStatus::Paid,
            created_at: "2025-01-15T10:31:40.000Z".into(),
            updated_at: None,
        }
    }

    fn patient() -> Patient {
        Patient {
            id: 1,
            record_number: "PT2025000001".into(),
            name: "John Doe".into(),
            age: 45,
            phone_number: "+1-555-0123".into(),
            address: Some("123 Main St".into()),
            initial_diagnosis: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(150000), "150.000");
        assert_eq!(format_amount(1250000), "1.250.000");
        assert_eq!(format_amount(-5000), "-5.000");
    }

    #[test]
    fn test_receipt_contents() {
        let receipt = render_receipt(&invoice(), Some(&patient()), &ReceiptConfig::default());

        assert!(receipt.starts_with("BSP CENTER PHYSIOTHERAPY CLINIC\n"));
        assert!(receipt.contains("\n\nTREATMENT RECEIPT\n\n"));
        assert!(receipt.contains("DATE: 15/01/2025 10:31\n"));
        assert!(receipt.contains("RECORD NUMBER: PT2025000001\n"));
        assert!(receipt.contains("Address: 123 Main St\n"));
        assert!(receipt.contains("- MANUAL THERAPY - RP 150.000\n  Notes: Lumbar region\n"));
        assert!(receipt.contains("- ULTRASOUND - RP 1.250.000\n\n"));
        assert!(receipt.contains("TOTAL: RP 1.400.000\n"));
        assert!(receipt.contains("STATUS: PAID\n"));
        assert!(receipt.ends_with("Semoga kesehatan selalu menyertai anda"));
        assert_eq!(receipt.matches(&"═".repeat(50)).count(), 4);
    }

    #[test]
    fn test_receipt_without_patient() {
        let receipt = render_receipt(&invoice(), None, &ReceiptConfig::default());
        assert!(receipt.contains("RECORD NUMBER: N/A\n"));
        assert!(receipt.contains("Address: No address recorded\n"));
    }

    #[test]
    fn test_config_validation_and_storage() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(ReceiptConfig::load(&db).unwrap(), ReceiptConfig::default());

        let blank = ReceiptConfig {
            header: "  ".into(),
            footer: "Thanks".into(),
        };
        assert!(blank.save(&db).is_err());

        let custom = ReceiptConfig {
            header: "KLINIK SEHAT".into(),
            footer: "Terima kasih".into(),
        };
        custom.save(&db).unwrap();
        assert_eq!(ReceiptConfig::load(&db).unwrap(), custom);

        let receipt = render_receipt(&invoice(), None, &custom);
        assert!(receipt.starts_with("KLINIK SEHAT\n\nTREATMENT RECEIPT"));
    }
}
