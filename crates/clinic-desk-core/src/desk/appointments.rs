//! Appointment booking.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::{optional, position, ClinicDesk};
use crate::db::Collection;
use crate::error::{DeskError, DeskResult};
use crate::models::dates::now_timestamp;
use crate::models::{
    max_id, sum_prices, Appointment, AppointmentForm, AppointmentTreatment, CustomExamination,
    Invoice, NewLogEntry, TargetType, Treatment, VitalSigns, VitalSignsForm, NOT_RECORDED,
};

pub(super) fn appointment_entry(action: String, appointment: &Appointment) -> NewLogEntry {
    NewLogEntry::new(action, TargetType::Appointment)
        .target(appointment.id)
        .patient(appointment.patient_id, &appointment.patient_name)
}

impl ClinicDesk {
    /// Book an appointment.
    ///
    /// Patient and operator names are copied onto the appointment, and the
    /// selected treatments are copied from the catalog at their current price.
    pub fn create_appointment(&mut self, form: AppointmentForm) -> DeskResult<Appointment> {
        if form.treatment_ids.is_empty() {
            return Err(DeskError::invalid("Select at least one treatment"));
        }
        form.vital_signs
            .validate()
            .map_err(DeskError::ValidationFailed)?;

        let patient = self.get_patient(form.patient_id)?;
        let operator = self.get_operator(form.operator_id)?;

        let catalog: Vec<Treatment> = self.db.load(Collection::Treatments)?;
        let treatments = form
            .treatment_ids
            .iter()
            .map(|&id| {
                let index = position(&catalog, "Treatment", id)?;
                let treatment = &catalog[index];
                Ok(AppointmentTreatment {
                    id: treatment.id,
                    name: treatment.name.clone(),
                    price: treatment.price,
                    notes: None,
                })
            })
            .collect::<DeskResult<Vec<_>>>()?;

        let vital_signs = self.build_vital_signs(form.vital_signs)?;
        let date = form
            .date
            .unwrap_or_else(|| Utc::now().date_naive())
            .format("%Y-%m-%d")
            .to_string();

        let mut appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        let appointment = Appointment {
            id: self.db.next_id(Collection::Appointments, max_id(&appointments))?,
            patient_id: patient.id,
            patient_name: patient.name,
            operator_id: operator.id,
            operator_name: operator.name,
            date,
            vital_signs,
            total_price: sum_prices(&treatments),
            treatments,
            created_at: now_timestamp(),
        };

        appointments.push(appointment.clone());
        self.db.save(Collection::Appointments, &appointments)?;
        info!(
            id = appointment.id,
            patient_id = appointment.patient_id,
            total = appointment.total_price,
            "Appointment created"
        );

        let action = format!("created a new appointment for {}", appointment.patient_name);
        self.record_activity(appointment_entry(action, &appointment))?;
        Ok(appointment)
    }

    /// Turn form readings into stored vital signs.
    ///
    /// Every configured custom examination gets an entry under its key with
    /// its current name and unit. Exams left blank store [`NOT_RECORDED`].
    fn build_vital_signs(&self, form: VitalSignsForm) -> DeskResult<VitalSigns> {
        let mut vitals = VitalSigns {
            blood_pressure: optional(form.blood_pressure).unwrap_or_else(|| NOT_RECORDED.to_string()),
            respiration_rate: form.respiration_rate.unwrap_or(0),
            heart_rate: form.heart_rate.unwrap_or(0),
            borg_scale: form.borg_scale.unwrap_or(0),
            ..VitalSigns::default()
        };

        let exams: Vec<CustomExamination> = self.db.load(Collection::CustomExaminations)?;
        if let Some(&unknown) = form.custom.keys().find(|id| !exams.iter().any(|e| e.id == **id)) {
            return Err(DeskError::not_found("Custom examination", unknown));
        }

        for exam in &exams {
            let value = form
                .custom
                .get(&exam.id)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or(NOT_RECORDED);
            vitals.custom.insert(
                exam.vital_sign_key(),
                json!({ "name": exam.name, "unit": exam.unit, "value": value }),
            );
        }
        Ok(vitals)
    }

    /// Set or clear the notes on one treatment of an appointment.
    ///
    /// Only the appointment is changed; an invoice already generated from it
    /// keeps its own copy.
    pub fn update_treatment_notes(
        &mut self,
        appointment_id: i64,
        treatment_id: i64,
        notes: Option<String>,
    ) -> DeskResult<Appointment> {
        let mut appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        let index = position(&appointments, "Appointment", appointment_id)?;

        let appointment = &mut appointments[index];
        let treatment = appointment
            .treatments
            .iter_mut()
            .find(|t| t.id == treatment_id)
            .ok_or_else(|| DeskError::not_found("Appointment treatment", treatment_id))?;
        treatment.notes = optional(notes);
        let updated = appointment.clone();

        self.db.save(Collection::Appointments, &appointments)?;
        info!(appointment_id, treatment_id, "Treatment notes updated");

        let action = format!("updated appointment for {}", updated.patient_name);
        self.record_activity(appointment_entry(action, &updated))?;
        Ok(updated)
    }

    /// Delete an appointment and every invoice generated from it.
    pub fn delete_appointment(&mut self, id: i64) -> DeskResult<Appointment> {
        let mut appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        let index = position(&appointments, "Appointment", id)?;

        let action = format!("deleted appointment of {}", appointments[index].patient_name);
        self.record_activity(appointment_entry(action, &appointments[index]))?;

        let removed = appointments.remove(index);
        self.db.save(Collection::Appointments, &appointments)?;

        let mut invoices: Vec<Invoice> = self.db.load(Collection::Invoices)?;
        let before = invoices.len();
        invoices.retain(|inv| inv.appointment_id != id);
        let cascaded = before - invoices.len();
        if cascaded > 0 {
            self.db.save(Collection::Invoices, &invoices)?;
        }
        if cascaded > 1 {
            warn!(id, cascaded, "Appointment had more than one invoice");
        }

        info!(id, cascaded, "Appointment deleted");
        Ok(removed)
    }

    pub fn get_appointment(&self, id: i64) -> DeskResult<Appointment> {
        let appointments: Vec<Appointment> = self.db.load(Collection::Appointments)?;
        let index = position(&appointments, "Appointment", id)?;
        Ok(appointments[index].clone())
    }

    pub fn list_appointments(&self) -> DeskResult<Vec<Appointment>> {
        Ok(self.db.load(Collection::Appointments)?)
    }
}
