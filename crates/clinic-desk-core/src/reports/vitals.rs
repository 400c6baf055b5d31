//! Per-patient vital sign history.

use serde::Serialize;

use crate::models::dates::epoch_millis;
use crate::models::Appointment;

/// Vital signs of one visit, for charting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSignPoint {
    pub appointment_id: i64,
    pub date: String,
    pub blood_pressure: String,
    pub heart_rate: u32,
    pub respiration_rate: u32,
    pub borg_scale: u32,
}

/// A patient's vital signs, oldest visit first.
pub fn vital_sign_trend(appointments: &[Appointment], patient_id: i64) -> Vec<VitalSignPoint> {
    let mut visits: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.patient_id == patient_id)
        .collect();
    visits.sort_by_key(|a| epoch_millis(&a.date));

    visits
        .into_iter()
        .map(|a| VitalSignPoint {
            appointment_id: a.id,
            date: a.date.clone(),
            blood_pressure: a.vital_signs.blood_pressure.clone(),
            heart_rate: a.vital_signs.heart_rate,
            respiration_rate: a.vital_signs.respiration_rate,
            borg_scale: a.vital_signs.borg_scale,
        })
        .collect()
}
