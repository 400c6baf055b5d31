//! Clinic catalog models: operators, treatments and custom examinations.

use serde::{Deserialize, Serialize};

use super::Record;

/// A staff member who performs appointments.
///
/// Operator identity is a free-text label; there is no login behind it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operator {
    pub id: i64,
    pub name: String,
    /// Role label (e.g., "Physiotherapist")
    pub role: String,
    #[serde(default)]
    pub created_at: String,
}

impl Record for Operator {
    fn id(&self) -> i64 {
        self.id
    }
}

/// A billable treatment in the price list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Treatment {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price in minor currency units, always > 0
    pub price: i64,
    #[serde(default)]
    pub created_at: String,
}

impl Record for Treatment {
    fn id(&self) -> i64 {
        self.id
    }
}

/// A clinic-defined measurement recorded alongside the standard vital signs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomExamination {
    pub id: i64,
    pub name: String,
    /// Unit label (e.g., "cm", "degrees")
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub created_at: String,
}

impl Record for CustomExamination {
    fn id(&self) -> i64 {
        self.id
    }
}

impl CustomExamination {
    /// Key under which this examination's value is stored in vital signs.
    pub fn vital_sign_key(&self) -> String {
        format!("custom_{}", self.id)
    }
}
