//! Invoice models and the payment status workflow.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::appointment::{AppointmentTreatment, VitalSigns};
use super::Record;

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [InvoiceStatus::Unpaid, InvoiceStatus::Paid, InvoiceStatus::Void];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "paid" => Ok(InvoiceStatus::Paid),
            "void" => Ok(InvoiceStatus::Void),
            other => Err(format!("Unknown invoice status: {}", other)),
        }
    }
}

/// Allowed status changes, as a set of `(from, to)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransitions {
    allowed: HashSet<(InvoiceStatus, InvoiceStatus)>,
}

impl StatusTransitions {
    /// Every status can move to every status, itself included.
    pub fn permissive() -> Self {
        let allowed = InvoiceStatus::ALL
            .iter()
            .flat_map(|from| InvoiceStatus::ALL.iter().map(move |to| (*from, *to)))
            .collect();
        Self { allowed }
    }

    /// Only the listed changes are allowed.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (InvoiceStatus, InvoiceStatus)>) -> Self {
        Self {
            allowed: pairs.into_iter().collect(),
        }
    }

    pub fn allows(&self, from: InvoiceStatus, to: InvoiceStatus) -> bool {
        self.allowed.contains(&(from, to))
    }
}

impl Default for StatusTransitions {
    fn default() -> Self {
        Self::permissive()
    }
}

/// A billing document derived from exactly one appointment.
///
/// Vital signs and treatments are deep copies taken at generation time, so
/// editing treatment notes on the invoice never touches the appointment (and
/// the reverse). Names are snapshots like on [`super::Appointment`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    /// `INV-<YYYYMM>-<seq>`
    pub invoice_number: String,
    pub appointment_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub operator_id: i64,
    pub operator_name: String,
    /// Invoice date (RFC 3339)
    pub date: String,
    pub appointment_date: String,
    #[serde(default)]
    pub vital_signs: VitalSigns,
    #[serde(default)]
    pub treatments: Vec<AppointmentTreatment>,
    pub total_amount: i64,
    pub status: InvoiceStatus,
    #[serde(rename = "created_at", default)]
    pub created_at: String,
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Invoice {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// Format an invoice number.
///
/// `seq` is the running count of all invoices, not a per-month counter, even
/// though the prefix carries the month.
pub fn format_invoice_number(year: i32, month: u32, seq: usize) -> Result<String, String> {
    if seq == 0 {
        return Err("Invoice sequence must start at 1".into());
    }
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid invoice month: {}", month));
    }
    Ok(format!("INV-{}{:02}-{:04}", year, month, seq))
}
