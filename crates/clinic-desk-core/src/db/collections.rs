//! Named JSON collections.

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Database, DbResult};

/// A named collection of records.
///
/// The keys match the ones the UI shell has always written, so a store
/// populated by older builds loads without migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Appointments,
    Invoices,
    Operators,
    Treatments,
    ActivityLogs,
    CustomExaminations,
}

impl Collection {
    /// Collections that make up a backup snapshot.
    pub const BACKUP: [Collection; 5] = [
        Collection::Operators,
        Collection::Treatments,
        Collection::Patients,
        Collection::Appointments,
        Collection::Invoices,
    ];

    /// Storage key.
    pub const fn key(self) -> &'static str {
        match self {
            Collection::Patients => "patient_management_data",
            Collection::Appointments => "appointments",
            Collection::Invoices => "invoices",
            Collection::Operators => "operators",
            Collection::Treatments => "treatments",
            Collection::ActivityLogs => "activity_logs",
            Collection::CustomExaminations => "custom_examinations",
        }
    }
}

/// Keys for scalar settings stored next to the collections.
pub mod setting_keys {
    /// Highest activity log ID the operator has seen.
    pub const LOGS_LAST_SEEN: &str = "logs_last_seen";
    /// Receipt header/footer.
    pub const RECEIPT_CONFIG: &str = "receipt_config";
    /// Desk configuration overrides.
    pub const DESK_CONFIG: &str = "desk_config";
}

/// Key holding the first unreadable value seen for a collection.
pub fn discarded_key(collection: Collection) -> String {
    format!("{}.discarded", collection.key())
}

impl Database {
    /// Read the raw JSON stored under a key.
    pub fn load_raw(&self, name: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM collections WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Replace the raw JSON stored under a key.
    pub fn save_raw(&self, name: &str, json: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO collections (name, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![name, json],
        )?;
        Ok(())
    }

    /// Load a collection.
    ///
    /// Missing collections are empty. A stored value that is not valid JSON
    /// for `T` is also treated as empty so the desk can still start fresh.
    /// The first such value is copied to [`discarded_key`] before anything
    /// can overwrite it.
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> DbResult<Vec<T>> {
        let Some(raw) = self.load_raw(collection.key())? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                let discarded = serde_json::from_str::<Vec<serde_json::Value>>(&raw)
                    .map(|rows| rows.len())
                    .ok();
                warn!(
                    collection = collection.key(),
                    discarded = ?discarded,
                    error = %e,
                    "Stored collection is corrupt, treating it as empty"
                );
                self.keep_discarded(collection, &raw)?;
                Ok(Vec::new())
            }
        }
    }

    /// Copy an unreadable collection aside, once.
    fn keep_discarded(&self, collection: Collection, raw: &str) -> DbResult<()> {
        let key = discarded_key(collection);
        if self.load_raw(&key)?.is_none() {
            self.save_raw(&key, raw)?;
            warn!(collection = collection.key(), key = %key, "Kept unreadable collection");
        }
        Ok(())
    }

    /// Replace a collection wholesale.
    pub fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> DbResult<()> {
        let json = serde_json::to_string(records)?;
        debug!(collection = collection.key(), count = records.len(), "Saving collection");
        self.save_raw(collection.key(), &json)
    }

    /// Load a scalar setting. Corrupt values read as absent.
    pub fn load_value<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let Some(raw) = self.load_raw(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Stored setting is corrupt, ignoring it");
                Ok(None)
            }
        }
    }

    /// Store a scalar setting.
    pub fn save_value<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value)?;
        self.save_raw(key, &json)
    }

    /// Overwrite several keys in one transaction.
    ///
    /// Either every key is written or none is.
    pub fn replace_all(&mut self, entries: &[(&str, String)]) -> DbResult<()> {
        let tx = self.transaction()?;
        for (name, json) in entries {
            tx.execute(
                r#"
                INSERT INTO collections (name, value, updated_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(name) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![name, json],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
