//! Full backup and restore of the clinic records.
//!
//! A backup holds the five record collections verbatim, plus a SHA-256
//! checksum over them. Restoring validates the whole file first and then
//! overwrites all five collections in a single transaction. The activity
//! log and settings are not part of a backup.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{Collection, Database, DbError, DbResult};
use crate::error::{DeskError, DeskResult};
use crate::models::dates::now_timestamp;
use crate::models::{Appointment, Invoice, Operator, Patient, Treatment};

/// Backup format version written by [`Snapshot::capture`].
pub const BACKUP_VERSION: &str = "1.0";

/// Field holding a collection inside a backup file.
pub fn backup_field(collection: Collection) -> &'static str {
    match collection {
        Collection::Operators => "operators",
        Collection::Treatments => "treatments",
        Collection::Patients => "patients",
        Collection::Appointments => "appointments",
        Collection::Invoices => "invoices",
        Collection::ActivityLogs => "activityLogs",
        Collection::CustomExaminations => "customExaminations",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub operators: Vec<Value>,
    pub treatments: Vec<Value>,
    pub patients: Vec<Value>,
    pub appointments: Vec<Value>,
    pub invoices: Vec<Value>,
    #[serde(default)]
    pub backup_date: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Hex SHA-256 over the five collections; older backups have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Record counts written by a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub operators: usize,
    pub treatments: usize,
    pub patients: usize,
    pub appointments: usize,
    pub invoices: usize,
}

impl Snapshot {
    /// Take a backup of the current records.
    pub fn capture(db: &Database) -> DbResult<Self> {
        let mut snapshot = Self {
            operators: db.load(Collection::Operators)?,
            treatments: db.load(Collection::Treatments)?,
            patients: db.load(Collection::Patients)?,
            appointments: db.load(Collection::Appointments)?,
            invoices: db.load(Collection::Invoices)?,
            backup_date: now_timestamp(),
            version: BACKUP_VERSION.to_string(),
            snapshot_id: Some(Uuid::new_v4().to_string()),
            checksum: None,
        };
        snapshot.checksum = Some(snapshot.compute_checksum()?);

        info!(
            snapshot_id = snapshot.snapshot_id.as_deref().unwrap_or_default(),
            patients = snapshot.patients.len(),
            invoices = snapshot.invoices.len(),
            "Backup captured"
        );
        Ok(snapshot)
    }

    /// The collections in backup order.
    pub fn collections(&self) -> [(Collection, &Vec<Value>); 5] {
        [
            (Collection::Operators, &self.operators),
            (Collection::Treatments, &self.treatments),
            (Collection::Patients, &self.patients),
            (Collection::Appointments, &self.appointments),
            (Collection::Invoices, &self.invoices),
        ]
    }

    pub fn compute_checksum(&self) -> DbResult<String> {
        let mut hasher = Sha256::new();
        for (_, records) in self.collections() {
            hasher.update(serde_json::to_vec(records)?);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Pretty-printed backup file contents.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and validate a backup file.
    ///
    /// Text that is not JSON is `StorageCorrupt`; a missing collection, a
    /// record of the wrong shape or a checksum mismatch is `ValidationFailed`.
    pub fn parse(json: &str) -> DeskResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| DeskError::StorageCorrupt(format!("Backup is not valid JSON: {}", e)))?;

        let Some(object) = value.as_object() else {
            return Err(DeskError::invalid("Invalid backup file structure"));
        };
        for collection in Collection::BACKUP {
            let field = backup_field(collection);
            if !object.get(field).is_some_and(Value::is_array) {
                return Err(DeskError::invalid(format!(
                    "Invalid backup file structure: missing {}",
                    field
                )));
            }
        }

        let snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| DeskError::invalid(format!("Invalid backup file structure: {}", e)))?;
        snapshot.check_records()?;
        snapshot.verify_checksum()?;
        Ok(snapshot)
    }

    fn check_records(&self) -> DeskResult<()> {
        check_shape::<Operator>(Collection::Operators, &self.operators)?;
        check_shape::<Treatment>(Collection::Treatments, &self.treatments)?;
        check_shape::<Patient>(Collection::Patients, &self.patients)?;
        check_shape::<Appointment>(Collection::Appointments, &self.appointments)?;
        check_shape::<Invoice>(Collection::Invoices, &self.invoices)
    }

    fn verify_checksum(&self) -> DeskResult<()> {
        let Some(expected) = &self.checksum else {
            return Ok(());
        };
        let actual = self.compute_checksum()?;
        if !actual.eq_ignore_ascii_case(expected) {
            warn!(expected = %expected, actual = %actual, "Backup checksum mismatch");
            return Err(DeskError::invalid("Backup checksum does not match its contents"));
        }
        Ok(())
    }
}

fn check_shape<T: DeserializeOwned>(collection: Collection, records: &[Value]) -> DeskResult<()> {
    for (index, record) in records.iter().enumerate() {
        if let Err(e) = T::deserialize(record) {
            return Err(DeskError::invalid(format!(
                "Invalid record {}[{}]: {}",
                backup_field(collection),
                index,
                e
            )));
        }
    }
    Ok(())
}

/// Replace the five record collections with the contents of a backup.
///
/// Nothing is written unless the whole backup validates.
pub fn restore(db: &mut Database, json: &str) -> DeskResult<RestoreSummary> {
    let snapshot = Snapshot::parse(json)?;

    let mut entries = Vec::with_capacity(Collection::BACKUP.len());
    for (collection, records) in snapshot.collections() {
        let json = serde_json::to_string(records).map_err(DbError::from)?;
        entries.push((collection.key(), json));
    }
    db.replace_all(&entries)?;

    let summary = RestoreSummary {
        operators: snapshot.operators.len(),
        treatments: snapshot.treatments.len(),
        patients: snapshot.patients.len(),
        appointments: snapshot.appointments.len(),
        invoices: snapshot.invoices.len(),
    };
    info!(
        snapshot_id = snapshot.snapshot_id.as_deref().unwrap_or("legacy"),
        backup_date = %snapshot.backup_date,
        patients = summary.patients,
        invoices = summary.invoices,
        "Backup restored"
    );
    Ok(summary)
}
