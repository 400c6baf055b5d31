//! Patient models.

use serde::{Deserialize, Serialize};

use super::Record;

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Sequence-allocated ID
    pub id: i64,
    /// Human-facing record number (`PT<year><6-digit seq>`), unique
    pub record_number: String,
    /// Full name
    pub name: String,
    /// Age in years, always > 0
    pub age: u32,
    /// Contact phone number
    pub phone_number: String,
    /// Home address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Diagnosis recorded at intake
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_diagnosis: Option<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: String,
}

impl Record for Patient {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Fields supplied when registering or editing a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientForm {
    pub name: String,
    pub age: u32,
    pub phone_number: String,
    pub address: Option<String>,
    pub initial_diagnosis: Option<String>,
}

impl PatientForm {
    /// Create a form with the required fields.
    pub fn new(name: impl Into<String>, age: u32, phone_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            phone_number: phone_number.into(),
            address: None,
            initial_diagnosis: None,
        }
    }
}

/// Format a record number from the year and sequence value.
pub fn format_record_number(year: i32, seq: i64) -> String {
    format!("PT{}{:06}", year, seq)
}
