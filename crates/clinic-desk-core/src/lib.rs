//! Clinic Desk Core Library
//!
//! Local-first front desk for a small physiotherapy clinic: patient register,
//! appointments, invoicing, reports and an activity log, kept in one SQLite
//! file as JSON collections.
//!
//! # Architecture
//!
//! ```text
//!   Patient ──► Appointment ──► Invoice ──► unpaid / paid / void
//!                   │               │
//!   Operators ──────┤               ├──► Receipt (plain text)
//!   Treatments ─────┘               └──► Spreadsheet (CSV)
//!
//!   every mutation ──► Activity log ──► unread count, linkified sentences
//!
//!   collections ──► Query engine (search, date range, sort, page)
//!               ──► Reports (dashboard, operator performance, vital signs)
//!               ──► Backup file ◄── Restore
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite store of JSON collections and ID sequences
//! - [`models`]: Domain types (Patient, Appointment, Invoice, etc.)
//! - [`desk`]: The [`ClinicDesk`] service tying store, log and workflow together
//! - [`activity`]: Activity log, unread tracking and linkification
//! - [`query`]: Paged list queries
//! - [`reports`]: Dashboard and report aggregates
//! - [`export`]: Backup/restore, receipts and CSV export

pub mod activity;
pub mod config;
pub mod db;
pub mod desk;
pub mod error;
pub mod export;
pub mod models;
pub mod query;
pub mod reports;

// Re-export commonly used types
pub use activity::{linkify, ActivityLog, Span, SpanKind, UnreadPoller};
pub use config::DeskConfig;
pub use db::Database;
pub use desk::{ClinicDesk, TreatmentForm};
pub use error::{DeskError, DeskResult};
pub use models::{
    ActivityLogEntry, Appointment, AppointmentForm, CustomExamination, Invoice, InvoiceStatus,
    Operator, Patient, PatientForm, Treatment, VitalSigns, VitalSignsForm,
};
pub use query::{DateRange, ListQuery, Page, SortDirection};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex, Once};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use activity::LinkTarget;
use models::{ActionKind, TargetType};
use reports::ReportFilter;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicDeskError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt data: {0}")]
    CorruptData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<DeskError> for ClinicDeskError {
    fn from(e: DeskError) -> Self {
        match e {
            DeskError::NotFound { .. } => ClinicDeskError::NotFound(e.to_string()),
            DeskError::ValidationFailed(message) => ClinicDeskError::InvalidInput(message),
            DeskError::StorageCorrupt(message) => ClinicDeskError::CorruptData(message),
            DeskError::Store(e) => ClinicDeskError::from(e),
        }
    }
}

impl From<db::DbError> for ClinicDeskError {
    fn from(e: db::DbError) -> Self {
        ClinicDeskError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicDeskError {
    fn from(e: serde_json::Error) -> Self {
        ClinicDeskError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicDeskError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicDeskError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

static TRACING: Once = Once::new();

/// Install a stderr log subscriber. Later calls are ignored.
///
/// `filter` uses `RUST_LOG` syntax, e.g. `"clinic_desk_core=debug"`.
#[uniffi::export]
pub fn init_tracing(filter: String) {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));
        // A host may already have installed its own subscriber.
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

/// Open or create the desk database at the given path.
#[uniffi::export]
pub fn open_desk(path: String) -> Result<Arc<ClinicDeskCore>, ClinicDeskError> {
    Ok(Arc::new(ClinicDeskCore::new(ClinicDesk::open(&path)?)))
}

/// Create an in-memory desk (for testing).
#[uniffi::export]
pub fn open_desk_in_memory() -> Result<Arc<ClinicDeskCore>, ClinicDeskError> {
    Ok(Arc::new(ClinicDeskCore::new(ClinicDesk::open_in_memory()?)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe desk wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicDeskCore {
    desk: Arc<Mutex<ClinicDesk>>,
    poller: Mutex<UnreadPoller>,
}

impl ClinicDeskCore {
    fn new(desk: ClinicDesk) -> Self {
        let poller = desk.unread_poller();
        Self {
            desk: Arc::new(Mutex::new(desk)),
            poller: Mutex::new(poller),
        }
    }
}

#[uniffi::export]
impl ClinicDeskCore {
    // =========================================================================
    // Session
    // =========================================================================

    pub fn current_operator(&self) -> Result<String, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.current_operator().to_string())
    }

    /// Set the operator stamped on new activity entries.
    pub fn set_current_operator(&self, name: String) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.set_current_operator(&name);
        Ok(())
    }

    /// Restrict invoice status changes to the given pairs.
    pub fn set_status_transitions(
        &self,
        transitions: Vec<FfiStatusTransition>,
    ) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.set_status_transitions(models::StatusTransitions::from_pairs(
            transitions.into_iter().map(|t| (t.from_status.into(), t.to_status.into())),
        ));
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn create_patient(&self, form: FfiPatientForm) -> Result<FfiPatient, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.create_patient(form.into())?.into())
    }

    pub fn update_patient(
        &self,
        id: i64,
        form: FfiPatientForm,
    ) -> Result<FfiPatient, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.update_patient(id, form.into())?.into())
    }

    pub fn delete_patient(&self, id: i64) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.delete_patient(id)?;
        Ok(())
    }

    pub fn get_patient(&self, id: i64) -> Result<FfiPatient, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.get_patient(id)?.into())
    }

    /// One page of the patient list.
    pub fn list_patients(&self, query: FfiListQuery) -> Result<FfiPatientPage, ClinicDeskError> {
        let desk = self.desk.lock()?;
        let params = query.into_query(desk.list_query())?;
        let page = desk.query_patients(&params)?;
        Ok(FfiPatientPage {
            info: FfiPageInfo::from(&page),
            items: page.items.into_iter().map(|p| p.into()).collect(),
        })
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    pub fn create_operator(&self, name: String, role: String) -> Result<FfiOperator, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.create_operator(&name, &role)?.into())
    }

    pub fn update_operator(
        &self,
        id: i64,
        name: String,
        role: String,
    ) -> Result<FfiOperator, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.update_operator(id, &name, &role)?.into())
    }

    pub fn delete_operator(&self, id: i64) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.delete_operator(id)?;
        Ok(())
    }

    pub fn list_operators(&self) -> Result<Vec<FfiOperator>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.list_operators()?.into_iter().map(|o| o.into()).collect())
    }

    pub fn create_treatment(
        &self,
        treatment: FfiTreatmentForm,
    ) -> Result<FfiTreatment, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.create_treatment(treatment.into())?.into())
    }

    pub fn update_treatment(
        &self,
        id: i64,
        treatment: FfiTreatmentForm,
    ) -> Result<FfiTreatment, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.update_treatment(id, treatment.into())?.into())
    }

    pub fn delete_treatment(&self, id: i64) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.delete_treatment(id)?;
        Ok(())
    }

    pub fn list_treatments(&self) -> Result<Vec<FfiTreatment>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.list_treatments()?.into_iter().map(|t| t.into()).collect())
    }

    pub fn create_custom_examination(
        &self,
        name: String,
        unit: String,
    ) -> Result<FfiCustomExamination, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.create_custom_examination(&name, &unit)?.into())
    }

    pub fn update_custom_examination(
        &self,
        id: i64,
        name: String,
        unit: String,
    ) -> Result<FfiCustomExamination, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.update_custom_examination(id, &name, &unit)?.into())
    }

    pub fn delete_custom_examination(&self, id: i64) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.delete_custom_examination(id)?;
        Ok(())
    }

    pub fn list_custom_examinations(&self) -> Result<Vec<FfiCustomExamination>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk
            .list_custom_examinations()?
            .into_iter()
            .map(|e| e.into())
            .collect())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    pub fn create_appointment(
        &self,
        form: FfiAppointmentForm,
    ) -> Result<FfiAppointment, ClinicDeskError> {
        let form = form.into_form()?;
        let mut desk = self.desk.lock()?;
        Ok(desk.create_appointment(form)?.into())
    }

    pub fn update_treatment_notes(
        &self,
        appointment_id: i64,
        treatment_id: i64,
        notes: Option<String>,
    ) -> Result<FfiAppointment, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk
            .update_treatment_notes(appointment_id, treatment_id, notes)?
            .into())
    }

    /// Delete an appointment and any invoice generated from it.
    pub fn delete_appointment(&self, id: i64) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.delete_appointment(id)?;
        Ok(())
    }

    pub fn get_appointment(&self, id: i64) -> Result<FfiAppointment, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.get_appointment(id)?.into())
    }

    pub fn list_appointments(
        &self,
        query: FfiListQuery,
    ) -> Result<FfiAppointmentPage, ClinicDeskError> {
        let desk = self.desk.lock()?;
        let params = query.into_query(desk.list_query())?;
        let page = desk.query_appointments(&params)?;
        Ok(FfiAppointmentPage {
            info: FfiPageInfo::from(&page),
            items: page.items.into_iter().map(|a| a.into()).collect(),
        })
    }

    // =========================================================================
    // Invoice Operations
    // =========================================================================

    /// Invoice for an appointment, generated on first call.
    pub fn generate_invoice(&self, appointment_id: i64) -> Result<FfiInvoice, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.generate_invoice(appointment_id)?.into())
    }

    pub fn invoice_for_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<Option<FfiInvoice>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.invoice_for_appointment(appointment_id)?.map(|i| i.into()))
    }

    pub fn update_invoice_treatment_notes(
        &self,
        invoice_id: i64,
        treatment_id: i64,
        notes: Option<String>,
    ) -> Result<FfiInvoice, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk
            .update_invoice_treatment_notes(invoice_id, treatment_id, notes)?
            .into())
    }

    pub fn set_invoice_status(
        &self,
        id: i64,
        status: FfiInvoiceStatus,
    ) -> Result<FfiInvoice, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.set_invoice_status(id, status.into())?.into())
    }

    pub fn delete_invoice(&self, id: i64) -> Result<(), ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        desk.delete_invoice(id)?;
        Ok(())
    }

    pub fn get_invoice(&self, id: i64) -> Result<FfiInvoice, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.get_invoice(id)?.into())
    }

    pub fn list_invoices(&self, query: FfiListQuery) -> Result<FfiInvoicePage, ClinicDeskError> {
        let desk = self.desk.lock()?;
        let params = query.into_query(desk.list_query())?;
        let page = desk.query_invoices(&params)?;
        Ok(FfiInvoicePage {
            info: FfiPageInfo::from(&page),
            items: page.items.into_iter().map(|i| i.into()).collect(),
        })
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub fn dashboard(&self) -> Result<FfiDashboardStats, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.dashboard()?.into())
    }

    pub fn operator_report(
        &self,
        filter: FfiReportFilter,
    ) -> Result<FfiOperatorReport, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.operator_report(&filter.into())?.into())
    }

    pub fn operator_invoices(
        &self,
        operator_id: i64,
        filter: FfiReportFilter,
    ) -> Result<Vec<FfiInvoice>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        let invoices = desk.operator_invoices(operator_id, &filter.into())?;
        Ok(invoices.into_iter().map(|i| i.into()).collect())
    }

    pub fn vital_sign_trend(&self, patient_id: i64) -> Result<Vec<FfiVitalSignPoint>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk
            .vital_sign_trend(patient_id)?
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    pub fn search_report_patients(&self, term: String) -> Result<Vec<FfiPatient>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk
            .search_report_patients(&term)?
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    // =========================================================================
    // Activity Log
    // =========================================================================

    /// All entries, newest first, with their linkified sentences.
    pub fn activity_log(&self) -> Result<Vec<FfiActivityEntry>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.activity_log()?.iter().map(FfiActivityEntry::from).collect())
    }

    pub fn unread_count(&self) -> Result<u64, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.unread_count()? as u64)
    }

    /// Unread count, or `None` when asked again within the poll interval.
    pub fn poll_unread(&self) -> Result<Option<u64>, ClinicDeskError> {
        let desk = self.desk.lock()?;
        let mut poller = self.poller.lock()?;
        Ok(desk.poll_unread(&mut poller)?.map(|n| n as u64))
    }

    pub fn mark_logs_read(&self) -> Result<(), ClinicDeskError> {
        let desk = self.desk.lock()?;
        desk.mark_logs_read()?;
        Ok(())
    }

    /// Trim the log to its newest entries; returns how many were removed.
    pub fn clear_old_logs(&self) -> Result<u64, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.clear_old_logs()? as u64)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Backup file contents as JSON.
    pub fn export_backup(&self) -> Result<String, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.export_backup()?)
    }

    pub fn restore_backup(&self, json: String) -> Result<FfiRestoreSummary, ClinicDeskError> {
        let mut desk = self.desk.lock()?;
        Ok(desk.restore_backup(&json)?.into())
    }

    pub fn receipt_config(&self) -> Result<FfiReceiptConfig, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.receipt_config()?.into())
    }

    pub fn save_receipt_config(&self, config: FfiReceiptConfig) -> Result<(), ClinicDeskError> {
        let desk = self.desk.lock()?;
        desk.save_receipt_config(&config.into())?;
        Ok(())
    }

    /// Printable receipt text for an invoice.
    pub fn render_receipt(&self, invoice_id: i64) -> Result<String, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.receipt(invoice_id)?)
    }

    pub fn export_patients_csv(&self) -> Result<String, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.patients_csv()?)
    }

    pub fn export_invoices_csv(&self) -> Result<String, ClinicDeskError> {
        let desk = self.desk.lock()?;
        Ok(desk.invoices_csv()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

fn parse_date(value: &str) -> Result<NaiveDate, ClinicDeskError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ClinicDeskError::InvalidInput(format!("Invalid date: {}", value)))
}

/// Sort fields travel as their snake_case names.
fn parse_field<F: DeserializeOwned>(name: &str) -> Result<F, ClinicDeskError> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| ClinicDeskError::InvalidInput(format!("Unknown sort field: {}", name)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiInvoiceStatus {
    Unpaid,
    Paid,
    Void,
}

impl From<InvoiceStatus> for FfiInvoiceStatus {
    fn from(s: InvoiceStatus) -> Self {
        match s {
            InvoiceStatus::Unpaid => FfiInvoiceStatus::Unpaid,
            InvoiceStatus::Paid => FfiInvoiceStatus::Paid,
            InvoiceStatus::Void => FfiInvoiceStatus::Void,
        }
    }
}

impl From<FfiInvoiceStatus> for InvoiceStatus {
    fn from(s: FfiInvoiceStatus) -> Self {
        match s {
            FfiInvoiceStatus::Unpaid => InvoiceStatus::Unpaid,
            FfiInvoiceStatus::Paid => InvoiceStatus::Paid,
            FfiInvoiceStatus::Void => InvoiceStatus::Void,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatusTransition {
    pub from_status: FfiInvoiceStatus,
    pub to_status: FfiInvoiceStatus,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub record_number: String,
    pub name: String,
    pub age: u32,
    pub phone_number: String,
    pub address: Option<String>,
    pub initial_diagnosis: Option<String>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            record_number: p.record_number,
            name: p.name,
            age: p.age,
            phone_number: p.phone_number,
            address: p.address,
            initial_diagnosis: p.initial_diagnosis,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientForm {
    pub name: String,
    pub age: u32,
    pub phone_number: String,
    pub address: Option<String>,
    pub initial_diagnosis: Option<String>,
}

impl From<FfiPatientForm> for PatientForm {
    fn from(f: FfiPatientForm) -> Self {
        Self {
            name: f.name,
            age: f.age,
            phone_number: f.phone_number,
            address: f.address,
            initial_diagnosis: f.initial_diagnosis,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOperator {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub created_at: String,
}

impl From<Operator> for FfiOperator {
    fn from(o: Operator) -> Self {
        Self {
            id: o.id,
            name: o.name,
            role: o.role,
            created_at: o.created_at,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub created_at: String,
}

impl From<Treatment> for FfiTreatment {
    fn from(t: Treatment) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            price: t.price,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatmentForm {
    pub name: String,
    pub description: String,
    pub price: i64,
}

impl From<FfiTreatmentForm> for TreatmentForm {
    fn from(f: FfiTreatmentForm) -> Self {
        Self {
            name: f.name,
            description: f.description,
            price: f.price,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCustomExamination {
    pub id: i64,
    pub name: String,
    pub unit: String,
    /// Key of this examination's value in [`FfiVitalSigns::custom`]
    pub vital_sign_key: String,
}

impl From<CustomExamination> for FfiCustomExamination {
    fn from(e: CustomExamination) -> Self {
        Self {
            vital_sign_key: e.vital_sign_key(),
            id: e.id,
            name: e.name,
            unit: e.unit,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCustomMeasurement {
    pub key: String,
    pub name: String,
    pub unit: String,
    pub value: String,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitalSigns {
    pub blood_pressure: String,
    pub respiration_rate: u32,
    pub heart_rate: u32,
    pub borg_scale: u32,
    pub custom: Vec<FfiCustomMeasurement>,
}

impl From<VitalSigns> for FfiVitalSigns {
    fn from(v: VitalSigns) -> Self {
        let custom = v
            .custom_measurements()
            .into_iter()
            .map(|(key, m)| FfiCustomMeasurement {
                key,
                name: m.name,
                unit: m.unit,
                value: m.value,
            })
            .collect();
        Self {
            blood_pressure: v.blood_pressure,
            respiration_rate: v.respiration_rate,
            heart_rate: v.heart_rate,
            borg_scale: v.borg_scale,
            custom,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCustomValue {
    pub examination_id: i64,
    pub value: String,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitalSignsForm {
    pub blood_pressure: Option<String>,
    pub respiration_rate: Option<u32>,
    pub heart_rate: Option<u32>,
    pub borg_scale: Option<u32>,
    pub custom: Vec<FfiCustomValue>,
}

impl From<FfiVitalSignsForm> for VitalSignsForm {
    fn from(f: FfiVitalSignsForm) -> Self {
        Self {
            blood_pressure: f.blood_pressure,
            respiration_rate: f.respiration_rate,
            heart_rate: f.heart_rate,
            borg_scale: f.borg_scale,
            custom: f
                .custom
                .into_iter()
                .map(|c| (c.examination_id, c.value))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentForm {
    pub patient_id: i64,
    pub operator_id: i64,
    pub treatment_ids: Vec<i64>,
    /// `YYYY-MM-DD`; today when absent
    pub date: Option<String>,
    pub vital_signs: FfiVitalSignsForm,
}

impl FfiAppointmentForm {
    fn into_form(self) -> Result<AppointmentForm, ClinicDeskError> {
        Ok(AppointmentForm {
            patient_id: self.patient_id,
            operator_id: self.operator_id,
            treatment_ids: self.treatment_ids,
            date: self.date.as_deref().map(parse_date).transpose()?,
            vital_signs: self.vital_signs.into(),
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentTreatment {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub notes: Option<String>,
}

impl From<models::AppointmentTreatment> for FfiAppointmentTreatment {
    fn from(t: models::AppointmentTreatment) -> Self {
        Self {
            id: t.id,
            name: t.name,
            price: t.price,
            notes: t.notes,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub operator_id: i64,
    pub operator_name: String,
    pub date: String,
    pub vital_signs: FfiVitalSigns,
    pub treatments: Vec<FfiAppointmentTreatment>,
    pub total_price: i64,
    pub created_at: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            patient_id: a.patient_id,
            patient_name: a.patient_name,
            operator_id: a.operator_id,
            operator_name: a.operator_name,
            date: a.date,
            vital_signs: a.vital_signs.into(),
            treatments: a.treatments.into_iter().map(|t| t.into()).collect(),
            total_price: a.total_price,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoice {
    pub id: i64,
    pub invoice_number: String,
    pub appointment_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub operator_id: i64,
    pub operator_name: String,
    pub date: String,
    pub appointment_date: String,
    pub vital_signs: FfiVitalSigns,
    pub treatments: Vec<FfiAppointmentTreatment>,
    pub total_amount: i64,
    pub status: FfiInvoiceStatus,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<Invoice> for FfiInvoice {
    fn from(i: Invoice) -> Self {
        Self {
            id: i.id,
            invoice_number: i.invoice_number,
            appointment_id: i.appointment_id,
            patient_id: i.patient_id,
            patient_name: i.patient_name,
            operator_id: i.operator_id,
            operator_name: i.operator_name,
            date: i.date,
            appointment_date: i.appointment_date,
            vital_signs: i.vital_signs.into(),
            treatments: i.treatments.into_iter().map(|t| t.into()).collect(),
            total_amount: i.total_amount,
            status: i.status.into(),
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

/// Parameters of a list request. Unset fields keep the list defaults.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiListQuery {
    pub search_term: String,
    /// `YYYY-MM-DD`, inclusive
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub end_date: Option<String>,
    /// snake_case field name, e.g. `"created_at"`
    pub sort_field: Option<String>,
    pub descending: bool,
    /// 1-based
    pub page: u32,
    pub page_size: Option<u32>,
}

impl FfiListQuery {
    fn into_query<F: DeserializeOwned>(
        self,
        base: ListQuery<F>,
    ) -> Result<ListQuery<F>, ClinicDeskError> {
        let range = DateRange {
            start: self.start_date.as_deref().map(parse_date).transpose()?,
            end: self.end_date.as_deref().map(parse_date).transpose()?,
        };
        let mut params = base
            .search(self.search_term)
            .date_range(range)
            .page(self.page as usize);

        if let Some(field) = &self.sort_field {
            let direction = if self.descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            params = params.sort_by(parse_field(field)?, direction);
        }
        if let Some(size) = self.page_size {
            params.page_size = size as usize;
        }
        Ok(params)
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPageInfo {
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> From<&Page<T>> for FfiPageInfo {
    fn from(p: &Page<T>) -> Self {
        Self {
            total_items: p.total_items as u64,
            total_pages: p.total_pages as u64,
            page: p.page as u64,
            page_size: p.page_size as u64,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientPage {
    pub items: Vec<FfiPatient>,
    pub info: FfiPageInfo,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentPage {
    pub items: Vec<FfiAppointment>,
    pub info: FfiPageInfo,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoicePage {
    pub items: Vec<FfiInvoice>,
    pub info: FfiPageInfo,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMonthBucket {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub new_patients: u64,
    pub appointments: u64,
    pub revenue: i64,
}

impl From<reports::MonthBucket> for FfiMonthBucket {
    fn from(b: reports::MonthBucket) -> Self {
        Self {
            year: b.year,
            month: b.month,
            label: b.label,
            new_patients: b.new_patients as u64,
            appointments: b.appointments as u64,
            revenue: b.revenue,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDashboardStats {
    pub total_patients: u64,
    pub new_patients_this_month: u64,
    pub total_appointments: u64,
    pub appointments_this_month: u64,
    pub total_revenue: i64,
    pub revenue_this_month: i64,
    pub months: Vec<FfiMonthBucket>,
}

impl From<reports::DashboardStats> for FfiDashboardStats {
    fn from(s: reports::DashboardStats) -> Self {
        Self {
            total_patients: s.total_patients as u64,
            new_patients_this_month: s.new_patients_this_month as u64,
            total_appointments: s.total_appointments as u64,
            appointments_this_month: s.appointments_this_month as u64,
            total_revenue: s.total_revenue,
            revenue_this_month: s.revenue_this_month,
            months: s.months.into_iter().map(|m| m.into()).collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportFilter {
    pub year: i32,
    /// 1-12; whole year when absent
    pub month: Option<u32>,
    /// Empty selects every operator
    pub operator_ids: Vec<i64>,
}

impl From<FfiReportFilter> for ReportFilter {
    fn from(f: FfiReportFilter) -> Self {
        Self {
            year: f.year,
            month: f.month,
            operator_ids: f.operator_ids,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOperatorReportRow {
    pub operator_id: i64,
    pub operator_name: String,
    pub appointment_count: u64,
    pub revenue: i64,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOperatorReport {
    pub rows: Vec<FfiOperatorReportRow>,
    pub total_appointments: u64,
    pub total_revenue: i64,
}

impl From<reports::OperatorReport> for FfiOperatorReport {
    fn from(r: reports::OperatorReport) -> Self {
        Self {
            rows: r
                .rows
                .into_iter()
                .map(|row| FfiOperatorReportRow {
                    operator_id: row.operator_id,
                    operator_name: row.operator_name,
                    appointment_count: row.appointment_count as u64,
                    revenue: row.revenue,
                })
                .collect(),
            total_appointments: r.total_appointments as u64,
            total_revenue: r.total_revenue,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitalSignPoint {
    pub appointment_id: i64,
    pub date: String,
    pub blood_pressure: String,
    pub heart_rate: u32,
    pub respiration_rate: u32,
    pub borg_scale: u32,
}

impl From<reports::VitalSignPoint> for FfiVitalSignPoint {
    fn from(p: reports::VitalSignPoint) -> Self {
        Self {
            appointment_id: p.appointment_id,
            date: p.date,
            blood_pressure: p.blood_pressure,
            heart_rate: p.heart_rate,
            respiration_rate: p.respiration_rate,
            borg_scale: p.borg_scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSpanKind {
    Text,
    PatientRef,
    EntityRef,
}

impl From<SpanKind> for FfiSpanKind {
    fn from(k: SpanKind) -> Self {
        match k {
            SpanKind::Text => FfiSpanKind::Text,
            SpanKind::PatientRef => FfiSpanKind::PatientRef,
            SpanKind::EntityRef => FfiSpanKind::EntityRef,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSpan {
    pub kind: FfiSpanKind,
    pub value: String,
    pub linkable: bool,
    pub patient_id: Option<i64>,
    /// `"patient"`, `"appointment"` or `"invoice"` for entity references
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
}

impl From<Span> for FfiSpan {
    fn from(s: Span) -> Self {
        let (patient_id, target_type, target_id) = match s.target {
            Some(LinkTarget::Patient(id)) => (Some(id), None, None),
            Some(LinkTarget::Entity { target_type, id }) => {
                (None, Some(target_type.as_str().to_string()), Some(id))
            }
            None => (None, None, None),
        };
        Self {
            kind: s.kind.into(),
            value: s.value,
            linkable: s.linkable,
            patient_id,
            target_type,
            target_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiActionKind {
    Created,
    Updated,
    Deleted,
    Other,
}

impl From<ActionKind> for FfiActionKind {
    fn from(k: ActionKind) -> Self {
        match k {
            ActionKind::Created => FfiActionKind::Created,
            ActionKind::Updated => FfiActionKind::Updated,
            ActionKind::Deleted => FfiActionKind::Deleted,
            ActionKind::Other => FfiActionKind::Other,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActivityEntry {
    pub id: i64,
    pub action: String,
    pub kind: FfiActionKind,
    pub operator_name: String,
    pub target_type: String,
    pub target_id: Option<i64>,
    pub target_name: Option<String>,
    pub patient_id: Option<i64>,
    pub patient_name: Option<String>,
    pub timestamp: String,
    pub details: Option<String>,
    pub spans: Vec<FfiSpan>,
}

impl From<&ActivityLogEntry> for FfiActivityEntry {
    fn from(e: &ActivityLogEntry) -> Self {
        Self {
            id: e.id,
            action: e.action.clone(),
            kind: ActionKind::classify(&e.action).into(),
            operator_name: e.operator_name.clone(),
            target_type: TargetType::as_str(&e.target_type).to_string(),
            target_id: e.target_id,
            target_name: e.target_name.clone(),
            patient_id: e.patient_id,
            patient_name: e.patient_name.clone(),
            timestamp: e.timestamp.clone(),
            details: e.details.clone(),
            spans: linkify(e).into_iter().map(|s| s.into()).collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReceiptConfig {
    pub header: String,
    pub footer: String,
}

impl From<export::ReceiptConfig> for FfiReceiptConfig {
    fn from(c: export::ReceiptConfig) -> Self {
        Self {
            header: c.header,
            footer: c.footer,
        }
    }
}

impl From<FfiReceiptConfig> for export::ReceiptConfig {
    fn from(c: FfiReceiptConfig) -> Self {
        Self {
            header: c.header,
            footer: c.footer,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRestoreSummary {
    pub operators: u64,
    pub treatments: u64,
    pub patients: u64,
    pub appointments: u64,
    pub invoices: u64,
}

impl From<export::RestoreSummary> for FfiRestoreSummary {
    fn from(s: export::RestoreSummary) -> Self {
        Self {
            operators: s.operators as u64,
            treatments: s.treatments as u64,
            patients: s.patients as u64,
            appointments: s.appointments as u64,
            invoices: s.invoices as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str) -> FfiPatientForm {
        FfiPatientForm {
            name: name.into(),
            age: 45,
            phone_number: "+1-555-0123".into(),
            address: None,
            initial_diagnosis: None,
        }
    }

    #[test]
    fn test_ffi_workflow() {
        let core = open_desk_in_memory().unwrap();
        core.set_current_operator("Dr. Sari".into()).unwrap();

        let op = core
            .create_operator("Dr. Sari".into(), "Physiotherapist".into())
            .unwrap();
        let tr = core
            .create_treatment(FfiTreatmentForm {
                name: "Manual therapy".into(),
                description: String::new(),
                price: 150000,
            })
            .unwrap();
        let patient = core.create_patient(form("John Doe")).unwrap();

        let appointment = core
            .create_appointment(FfiAppointmentForm {
                patient_id: patient.id,
                operator_id: op.id,
                treatment_ids: vec![tr.id],
                date: Some("2025-03-10".into()),
                vital_signs: FfiVitalSignsForm {
                    blood_pressure: Some("120/80".into()),
                    respiration_rate: None,
                    heart_rate: Some(72),
                    borg_scale: None,
                    custom: Vec::new(),
                },
            })
            .unwrap();
        assert_eq!(appointment.total_price, 150000);

        let invoice = core.generate_invoice(appointment.id).unwrap();
        assert_eq!(invoice.status, FfiInvoiceStatus::Unpaid);

        let paid = core
            .set_invoice_status(invoice.id, FfiInvoiceStatus::Paid)
            .unwrap();
        assert!(paid.updated_at.is_some());

        let log = core.activity_log().unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].action, "marked invoice as paid for John Doe");
        assert_eq!(log[3].operator_name, "Dr. Sari");
        assert_eq!(log[3].kind, FfiActionKind::Created);
        assert!(log[2]
            .spans
            .iter()
            .any(|s| s.linkable && s.patient_id == Some(patient.id)));
        assert_eq!(core.unread_count().unwrap(), 4);

        core.mark_logs_read().unwrap();
        assert_eq!(core.unread_count().unwrap(), 0);
    }

    #[test]
    fn test_list_query_parsing() {
        let core = open_desk_in_memory().unwrap();
        core.create_patient(form("Bob")).unwrap();
        core.create_patient(form("Alice")).unwrap();

        let page = core
            .list_patients(FfiListQuery {
                sort_field: Some("name".into()),
                page: 1,
                ..FfiListQuery::default()
            })
            .unwrap();
        assert_eq!(page.items[0].name, "Alice");
        assert_eq!(page.info.total_items, 2);

        let err = core
            .list_patients(FfiListQuery {
                sort_field: Some("shoe_size".into()),
                ..FfiListQuery::default()
            })
            .unwrap_err();
        assert!(matches!(err, ClinicDeskError::InvalidInput(_)));

        let err = core
            .list_patients(FfiListQuery {
                start_date: Some("10/03/2025".into()),
                ..FfiListQuery::default()
            })
            .unwrap_err();
        assert!(matches!(err, ClinicDeskError::InvalidInput(_)));
    }

    #[test]
    fn test_error_mapping() {
        let core = open_desk_in_memory().unwrap();
        assert!(matches!(
            core.get_patient(42).unwrap_err(),
            ClinicDeskError::NotFound(_)
        ));
        assert!(matches!(
            core.restore_backup("{oops".into()).unwrap_err(),
            ClinicDeskError::CorruptData(_)
        ));
    }

    #[test]
    fn test_restricted_transitions() {
        let core = open_desk_in_memory().unwrap();
        core.set_status_transitions(vec![FfiStatusTransition {
            from_status: FfiInvoiceStatus::Unpaid,
            to_status: FfiInvoiceStatus::Paid,
        }])
        .unwrap();

        let op = core.create_operator("Dr. Sari".into(), "PT".into()).unwrap();
        let tr = core
            .create_treatment(FfiTreatmentForm {
                name: "Ultrasound".into(),
                description: String::new(),
                price: 80000,
            })
            .unwrap();
        let patient = core.create_patient(form("Jane Smith")).unwrap();
        let appointment = core
            .create_appointment(FfiAppointmentForm {
                patient_id: patient.id,
                operator_id: op.id,
                treatment_ids: vec![tr.id],
                date: None,
                vital_signs: FfiVitalSignsForm {
                    blood_pressure: None,
                    respiration_rate: None,
                    heart_rate: None,
                    borg_scale: None,
                    custom: Vec::new(),
                },
            })
            .unwrap();
        let invoice = core.generate_invoice(appointment.id).unwrap();

        core.set_invoice_status(invoice.id, FfiInvoiceStatus::Paid)
            .unwrap();
        assert!(matches!(
            core.set_invoice_status(invoice.id, FfiInvoiceStatus::Void)
                .unwrap_err(),
            ClinicDeskError::InvalidInput(_)
        ));
    }
}
