//! Invoice generation and payment status.

use chrono::{Datelike, Utc};
use tracing::{debug, info};

use super::{optional, position, ClinicDesk};
use crate::db::Collection;
use crate::error::{DeskError, DeskResult};
use crate::models::dates::format_timestamp;
use crate::models::{
    format_invoice_number, max_id, Appointment, Invoice, InvoiceStatus, NewLogEntry, TargetType,
};

fn invoice_entry(action: String, invoice: &Invoice) -> NewLogEntry {
    NewLogEntry::new(action, TargetType::Invoice)
        .target(invoice.id)
        .target_name(&invoice.invoice_number)
        .patient(invoice.patient_id, &invoice.patient_name)
}

impl ClinicDesk {
    /// Generate the invoice for an appointment.
    ///
    /// Idempotent: when the appointment already has an invoice, that invoice
    /// is returned unchanged and nothing is logged.
    pub fn generate_invoice(&mut self, appointment_id: i64) -> DeskResult<Invoice> {
        let appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        let index = position(&appointments, "Appointment", appointment_id)?;
        let appointment = &appointments[index];

        let mut invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        if let Some(existing) = invoices.iter().find(|inv| inv.appointment_id == appointment_id) {
            debug!(appointment_id, invoice_id = existing.id, "Invoice already exists");
            return Ok(existing.clone());
        }

        let now = Utc::now();
        // Running count over all invoices, not per month.
        let invoice_number = format_invoice_number(now.year(), now.month(), invoices.len() + 1)
            .map_err(DeskError::ValidationFailed)?;
        let stamp = format_timestamp(now);

        let invoice = Invoice {
            id: self.db.next_id(Collection::Invoices, max_id(&invoices))?,
            invoice_number,
            appointment_id,
            patient_id: appointment.patient_id,
            patient_name: appointment.patient_name.clone(),
            operator_id: appointment.operator_id,
            operator_name: appointment.operator_name.clone(),
            date: stamp.clone(),
            appointment_date: appointment.date.clone(),
            vital_signs: appointment.vital_signs.clone(),
            treatments: appointment.treatments.clone(),
            total_amount: appointment.total_price,
            status: InvoiceStatus::Unpaid,
            created_at: stamp,
            updated_at: None,
        };

        invoices.push(invoice.clone());
        self.db.save(Collection::Invoices, &invoices)?;
        info!(
            id = invoice.id,
            number = %invoice.invoice_number,
            appointment_id,
            amount = invoice.total_amount,
            "Invoice generated"
        );

        let entry = NewLogEntry::new(
            format!("created an invoice from appointment of {}", invoice.patient_name),
            TargetType::Invoice,
        )
        .target(invoice.id)
        .target_name(format!("Appointment {}", appointment_id))
        .patient(invoice.patient_id, &invoice.patient_name)
        .operator(&appointment.operator_name);
        self.record_activity(entry)?;

        Ok(invoice)
    }

    /// The invoice generated from an appointment, if any.
    pub fn invoice_for_appointment(&self, appointment_id: i64) -> DeskResult<Option<Invoice>> {
        let invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        Ok(invoices
            .into_iter()
            .find(|inv| inv.appointment_id == appointment_id))
    }

    /// Set or clear notes on the invoice's own copy of a treatment.
    pub fn update_invoice_treatment_notes(
        &mut self,
        invoice_id: i64,
        treatment_id: i64,
        notes: Option<String>,
    ) -> DeskResult<Invoice> {
        let mut invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        let index = position(&invoices, "Invoice", invoice_id)?;

        let invoice = &mut invoices[index];
        let treatment = invoice
            .treatments
            .iter_mut()
            .find(|t| t.id == treatment_id)
            .ok_or_else(|| DeskError::not_found("Invoice treatment", treatment_id))?;
        treatment.notes = optional(notes);
        invoice.updated_at = Some(format_timestamp(Utc::now()));
        let updated = invoice.clone();

        self.db.save(Collection::Invoices, &invoices)?;
        info!(invoice_id, treatment_id, "Invoice treatment notes updated");

        let action = format!("updated invoice for {}", updated.patient_name);
        self.record_activity(invoice_entry(action, &updated))?;
        Ok(updated)
    }

    /// Move an invoice to a new payment status.
    ///
    /// The change must be allowed by the desk's transition table.
    pub fn set_invoice_status(&mut self, id: i64, status: InvoiceStatus) -> DeskResult<Invoice> {
        let mut invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        let index = position(&invoices, "Invoice", id)?;

        let invoice = &mut invoices[index];
        let from = invoice.status;
        if !self.transitions.allows(from, status) {
            return Err(DeskError::invalid(format!(
                "Invoice cannot change from {} to {}",
                from, status
            )));
        }

        invoice.status = status;
        invoice.updated_at = Some(format_timestamp(Utc::now()));
        let updated = invoice.clone();

        self.db.save(Collection::Invoices, &invoices)?;
        info!(id, from = %from, to = %status, "Invoice status changed");

        let action = if status == InvoiceStatus::Paid {
            format!("marked invoice as paid for {}", updated.patient_name)
        } else {
            format!("updated invoice for {}", updated.patient_name)
        };
        self.record_activity(invoice_entry(action, &updated))?;
        Ok(updated)
    }

    /// Delete an invoice. The appointment is kept, so a new invoice can be
    /// generated from it.
    pub fn delete_invoice(&mut self, id: i64) -> DeskResult<Invoice> {
        let mut invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        let index = position(&invoices, "Invoice", id)?;

        let invoice = &invoices[index];
        let entry = invoice_entry(format!("deleted invoice of {}", invoice.patient_name), invoice)
            .operator(&invoice.operator_name);
        self.record_activity(entry)?;

        let removed = invoices.remove(index);
        self.db.save(Collection::Invoices, &invoices)?;
        info!(id, number = %removed.invoice_number, "Invoice deleted");
        Ok(removed)
    }

    pub fn get_invoice(&self, id: i64) -> DeskResult<Invoice> {
        let invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        let index = position(&invoices, "Invoice", id)?;
        Ok(invoices[index].clone())
    }

    pub fn list_invoices(&self) -> DeskResult<Vec<Invoice>> {
        Ok(self.db.load(Collection::Invoices)?)
    }
}
