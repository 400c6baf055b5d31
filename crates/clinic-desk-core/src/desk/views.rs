//! Read-side views: paged lists, reports and exports over fresh data.

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::ClinicDesk;
use crate::db::Collection;
use crate::error::DeskResult;
use crate::export::{self, ReceiptConfig, RestoreSummary, Snapshot};
use crate::models::{Appointment, Invoice, Operator, Patient};
use crate::query::{self, AppointmentField, InvoiceField, ListQuery, Page, PatientField};
use crate::reports::{self, DashboardStats, OperatorReport, ReportFilter, VitalSignPoint};

impl ClinicDesk {
    /// A list query with the configured page size.
    pub fn list_query<F>(&self) -> ListQuery<F> {
        ListQuery::new(self.config.page_size)
    }

    pub fn query_patients(&self, params: &ListQuery<PatientField>) -> DeskResult<Page<Patient>> {
        let patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        Ok(query::query(&patients, params))
    }

    pub fn query_appointments(
        &self,
        params: &ListQuery<AppointmentField>,
    ) -> DeskResult<Page<Appointment>> {
        let appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        Ok(query::query(&appointments, params))
    }

    pub fn query_invoices(&self, params: &ListQuery<InvoiceField>) -> DeskResult<Page<Invoice>> {
        let invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        Ok(query::query(&invoices, params))
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Dashboard as of `today`, over the configured number of trend months.
    pub fn dashboard_on(&self, today: NaiveDate) -> DeskResult<DashboardStats> {
        let patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        let appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        let invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        Ok(reports::dashboard(
            &patients,
            &appointments,
            &invoices,
            today,
            self.config.trend_months,
        ))
    }

    pub fn dashboard(&self) -> DeskResult<DashboardStats> {
        self.dashboard_on(Utc::now().date_naive())
    }

    pub fn operator_report(&self, filter: &ReportFilter) -> DeskResult<OperatorReport> {
        let appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        let invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        let operators: Vec<Operator> = self.db.load(Collection::Operators)?;
        Ok(reports::operator_performance(
            &appointments,
            &invoices,
            &operators,
            filter,
        ))
    }

    pub fn operator_invoices(
        &self,
        operator_id: i64,
        filter: &ReportFilter,
    ) -> DeskResult<Vec<Invoice>> {
        let invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        Ok(reports::operator_invoices(&invoices, operator_id, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn vital_sign_trend(&self, patient_id: i64) -> DeskResult<Vec<VitalSignPoint>> {
        let appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        Ok(reports::vital_sign_trend(&appointments, patient_id))
    }

    /// Patient picker for reports, capped at the configured limit.
    pub fn search_report_patients(&self, term: &str) -> DeskResult<Vec<Patient>> {
        let patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        Ok(
            query::search_patients_for_report(&patients, term, self.config.report_patient_search_limit)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    // =========================================================================
    // Backup, receipts and spreadsheets
    // =========================================================================

    /// Backup file contents for the current records.
    pub fn export_backup(&self) -> DeskResult<String> {
        let snapshot = Snapshot::capture(&self.db)?;
        Ok(snapshot.to_json().map_err(crate::db::DbError::from)?)
    }

    /// Replace all records with a backup. The activity log is kept.
    pub fn restore_backup(&mut self, json: &str) -> DeskResult<RestoreSummary> {
        let summary = export::restore(&mut self.db, json)?;
        info!(operator = %self.operator, "Records replaced from backup");
        Ok(summary)
    }

    pub fn receipt_config(&self) -> DeskResult<ReceiptConfig> {
        Ok(ReceiptConfig::load(&self.db)?)
    }

    pub fn save_receipt_config(&self, config: &ReceiptConfig) -> DeskResult<()> {
        config.save(&self.db)
    }

    /// Printable receipt for an invoice.
    pub fn receipt(&self, invoice_id: i64) -> DeskResult<String> {
        let invoice = self.get_invoice(invoice_id)?;
        let patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        let patient = patients.iter().find(|p| p.id == invoice.patient_id);
        let config = ReceiptConfig::load(&self.db)?;
        Ok(export::render_receipt(&invoice, patient, &config))
    }

    pub fn patients_csv(&self) -> DeskResult<String> {
        let patients: Vec<Patient> = self.db.load(Collection::Patients)?;
        Ok(export::patients_csv(&patients))
    }

    pub fn invoices_csv(&self) -> DeskResult<String> {
        let invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        Ok(export::invoices_csv(&invoices))
    }
}
