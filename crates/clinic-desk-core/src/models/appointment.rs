//! Appointment models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;

/// Placeholder stored for a blood pressure that was not taken.
pub const NOT_RECORDED: &str = "Not recorded";

/// Highest value on the Borg exertion scale.
pub const BORG_SCALE_MAX: u32 = 10;

/// Vital signs taken during a visit.
///
/// Numeric readings use 0 for "not recorded". Custom examination values live
/// under `custom_<examId>` keys and are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    #[serde(default = "not_recorded")]
    pub blood_pressure: String,
    #[serde(default)]
    pub respiration_rate: u32,
    #[serde(default)]
    pub heart_rate: u32,
    #[serde(default)]
    pub borg_scale: u32,
    #[serde(flatten)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

fn not_recorded() -> String {
    NOT_RECORDED.to_string()
}

impl Default for VitalSigns {
    fn default() -> Self {
        Self {
            blood_pressure: not_recorded(),
            respiration_rate: 0,
            heart_rate: 0,
            borg_scale: 0,
            custom: BTreeMap::new(),
        }
    }
}

/// A custom examination value as stored in [`VitalSigns::custom`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomMeasurement {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub value: String,
}

impl VitalSigns {
    /// Custom measurements keyed by their storage key, skipping entries that
    /// do not have the expected shape.
    pub fn custom_measurements(&self) -> Vec<(String, CustomMeasurement)> {
        self.custom
            .iter()
            .filter(|(key, _)| key.starts_with("custom_"))
            .filter_map(|(key, value)| {
                serde_json::from_value(value.clone())
                    .ok()
                    .map(|m| (key.clone(), m))
            })
            .collect()
    }
}

/// A treatment performed during an appointment (copied from the catalog).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentTreatment {
    /// Catalog treatment ID
    pub id: i64,
    pub name: String,
    /// Price in minor currency units at the time of the visit
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A clinical visit.
///
/// `patient_name` and `operator_name` are snapshots taken when the
/// appointment was created. They are not kept in sync with later edits to
/// the patient or operator record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub operator_id: i64,
    pub operator_name: String,
    /// Visit date (`YYYY-MM-DD`)
    pub date: String,
    #[serde(default)]
    pub vital_signs: VitalSigns,
    #[serde(default)]
    pub treatments: Vec<AppointmentTreatment>,
    /// Always the sum of `treatments[].price`
    pub total_price: i64,
    #[serde(rename = "created_at", default)]
    pub created_at: String,
}

impl Record for Appointment {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Appointment {
    /// Sum of treatment prices.
    pub fn treatments_total(&self) -> i64 {
        sum_prices(&self.treatments)
    }
}

/// Sum the prices of a treatment list.
pub fn sum_prices(treatments: &[AppointmentTreatment]) -> i64 {
    treatments.iter().map(|t| t.price).sum()
}

/// Vital signs as entered on the appointment form. `None` means not taken.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VitalSignsForm {
    pub blood_pressure: Option<String>,
    pub respiration_rate: Option<u32>,
    pub heart_rate: Option<u32>,
    pub borg_scale: Option<u32>,
    /// Custom examination ID → entered value
    pub custom: BTreeMap<i64, String>,
}

impl VitalSignsForm {
    /// Check the entered readings.
    pub fn validate(&self) -> Result<(), String> {
        if self.respiration_rate == Some(0) {
            return Err("Please enter a valid respiration rate".into());
        }
        if self.heart_rate == Some(0) {
            return Err("Please enter a valid heart rate".into());
        }
        if let Some(borg) = self.borg_scale {
            if !(1..=BORG_SCALE_MAX).contains(&borg) {
                return Err(format!("Borg scale must be between 1 and {}", BORG_SCALE_MAX));
            }
        }
        Ok(())
    }
}

/// Fields supplied when booking an appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentForm {
    pub patient_id: i64,
    pub operator_id: i64,
    /// Catalog treatments performed, in display order
    pub treatment_ids: Vec<i64>,
    /// Visit date, today when absent
    pub date: Option<NaiveDate>,
    pub vital_signs: VitalSignsForm,
}
