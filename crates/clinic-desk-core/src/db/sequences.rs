//! Monotonic ID sequences.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{Collection, Database, DbResult};

/// Sequence backing patient record numbers (`PT<year><seq>`).
pub const RECORD_NUMBER_SEQUENCE: &str = "patient_record_number";

impl Database {
    /// Allocate the next value of a named sequence.
    ///
    /// The result is always greater than `floor` and than every value
    /// previously handed out for `name`.
    pub fn next_sequence(&self, name: &str, floor: i64) -> DbResult<i64> {
        let floor = floor.max(0);
        let value: i64 = self.conn.query_row(
            r#"
            INSERT INTO sequences (name, value, updated_at)
            VALUES (?1, ?2 + 1, datetime('now'))
            ON CONFLICT(name) DO UPDATE SET
                value = MAX(sequences.value, ?2) + 1,
                updated_at = datetime('now')
            RETURNING value
            "#,
            params![name, floor],
            |row| row.get(0),
        )?;
        debug!(sequence = name, value, "Allocated sequence value");
        Ok(value)
    }

    /// Allocate a record ID for a collection.
    ///
    /// `max_existing` is the largest ID currently stored in the collection, so
    /// records imported from a backup never collide with new ones.
    pub fn next_id(&self, collection: Collection, max_existing: i64) -> DbResult<i64> {
        self.next_sequence(collection.key(), max_existing)
    }

    /// Current value of a sequence without advancing it.
    pub fn current_sequence(&self, name: &str) -> DbResult<i64> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM sequences WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }
}
