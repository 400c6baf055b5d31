//! Activity log models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of record an activity entry refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Patient,
    Appointment,
    Invoice,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Patient => "patient",
            TargetType::Appointment => "appointment",
            TargetType::Invoice => "invoice",
        }
    }

    /// Match a word of an action sentence, ignoring case.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "patient" => Some(TargetType::Patient),
            "appointment" => Some(TargetType::Appointment),
            "invoice" => Some(TargetType::Invoice),
            _ => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    /// Monotonic ID, recovered from the stored log on start
    pub id: i64,
    /// Free-text sentence (e.g., "created a new appointment for Jane Smith")
    pub action: String,
    pub operator_name: String,
    pub target_type: TargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An entry about to be appended; the log assigns ID and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub action: String,
    /// Overrides the desk's current operator when set
    pub operator_name: Option<String>,
    pub target_type: TargetType,
    pub target_id: Option<i64>,
    pub target_name: Option<String>,
    pub patient_id: Option<i64>,
    pub patient_name: Option<String>,
    pub details: Option<String>,
}

impl NewLogEntry {
    pub fn new(action: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            action: action.into(),
            operator_name: None,
            target_type,
            target_id: None,
            target_name: None,
            patient_id: None,
            patient_name: None,
            details: None,
        }
    }

    pub fn target(mut self, id: i64) -> Self {
        self.target_id = Some(id);
        self
    }

    pub fn target_name(mut self, name: impl Into<String>) -> Self {
        self.target_name = Some(name.into());
        self
    }

    pub fn patient(mut self, id: i64, name: impl Into<String>) -> Self {
        self.patient_id = Some(id);
        self.patient_name = Some(name.into());
        self
    }

    pub fn operator(mut self, name: impl Into<String>) -> Self {
        self.operator_name = Some(name.into());
        self
    }
}

/// Coarse classification of an action sentence, for icons and colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Created,
    Updated,
    Deleted,
    Other,
}

impl ActionKind {
    pub fn classify(action: &str) -> Self {
        if action.contains("new") || action.contains("created") {
            ActionKind::Created
        } else if action.contains("edit") || action.contains("updated") {
            ActionKind::Updated
        } else if action.contains("delete") || action.contains("removed") {
            ActionKind::Deleted
        } else {
            ActionKind::Other
        }
    }
}
