//! Append-only activity log service.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info};

use crate::config::DeskConfig;
use crate::db::{setting_keys, Collection, Database, DbResult};
use crate::models::dates::now_timestamp;
use crate::models::{ActivityLogEntry, NewLogEntry};

/// Activity log with its own ID counter.
///
/// Construct one per process with [`ActivityLog::recover`]; the counter is
/// rebuilt from the stored entries, so nothing else has to be persisted.
pub struct ActivityLog {
    next_id: i64,
    retention_cap: usize,
    maintenance_keep: usize,
    subscribers: Vec<Sender<ActivityLogEntry>>,
}

impl ActivityLog {
    /// Rebuild the log service from the stored entries.
    pub fn recover(db: &Database, config: &DeskConfig) -> DbResult<Self> {
        let entries: Vec<ActivityLogEntry> = db.load(Collection::ActivityLogs)?;
        let next_id = next_id_after(&entries);
        debug!(next_id, stored = entries.len(), "Recovered activity log counter");

        Ok(Self {
            next_id,
            retention_cap: config.log_retention_cap,
            maintenance_keep: config.log_maintenance_keep,
            subscribers: Vec::new(),
        })
    }

    /// ID the next appended entry will get.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Append an entry at the front of the log and trim to the retention cap.
    pub fn append(
        &mut self,
        db: &Database,
        entry: NewLogEntry,
        current_operator: &str,
    ) -> DbResult<ActivityLogEntry> {
        let mut entries: Vec<ActivityLogEntry> = db.load(Collection::ActivityLogs)?;
        let id = self.next_id.max(next_id_after(&entries));

        let logged = ActivityLogEntry {
            id,
            action: entry.action,
            operator_name: entry
                .operator_name
                .unwrap_or_else(|| current_operator.to_string()),
            target_type: entry.target_type,
            target_id: entry.target_id,
            target_name: entry.target_name,
            patient_id: entry.patient_id,
            patient_name: entry.patient_name,
            timestamp: now_timestamp(),
            details: entry.details,
        };

        entries.insert(0, logged.clone());
        entries.truncate(self.retention_cap);
        db.save(Collection::ActivityLogs, &entries)?;
        self.next_id = id + 1;

        info!(id, action = %logged.action, operator = %logged.operator_name, "Activity logged");
        self.notify(&logged);
        Ok(logged)
    }

    /// All stored entries, newest first.
    pub fn entries(&self, db: &Database) -> DbResult<Vec<ActivityLogEntry>> {
        db.load(Collection::ActivityLogs)
    }

    /// Keep only the newest maintenance-cap entries. Returns how many were dropped.
    pub fn clear_old(&self, db: &Database) -> DbResult<usize> {
        let mut entries: Vec<ActivityLogEntry> = db.load(Collection::ActivityLogs)?;
        if entries.len() <= self.maintenance_keep {
            return Ok(0);
        }

        let removed = entries.len() - self.maintenance_keep;
        entries.truncate(self.maintenance_keep);
        db.save(Collection::ActivityLogs, &entries)?;
        info!(removed, kept = entries.len(), "Cleared old activity entries");
        Ok(removed)
    }

    /// Watermark of the last entry the operator has seen.
    pub fn last_seen(&self, db: &Database) -> DbResult<i64> {
        Ok(db
            .load_value::<i64>(setting_keys::LOGS_LAST_SEEN)?
            .unwrap_or(0))
    }

    /// Number of entries newer than the watermark.
    pub fn unread_count(&self, db: &Database) -> DbResult<usize> {
        let last_seen = self.last_seen(db)?;
        let entries = self.entries(db)?;
        Ok(entries.iter().filter(|e| e.id > last_seen).count())
    }

    /// Move the watermark to the newest entry. Returns the new watermark, or
    /// `None` when the log is empty.
    pub fn mark_read(&self, db: &Database) -> DbResult<Option<i64>> {
        let entries = self.entries(db)?;
        let Some(latest) = entries.iter().map(|e| e.id).max() else {
            return Ok(None);
        };

        db.save_value(setting_keys::LOGS_LAST_SEEN, &latest)?;
        debug!(latest, "Marked activity log as read");
        Ok(Some(latest))
    }

    /// Receive every entry appended from now on.
    pub fn subscribe(&mut self) -> Receiver<ActivityLogEntry> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, entry: &ActivityLogEntry) {
        // Dropped receivers fail to send and are pruned.
        self.subscribers.retain(|tx| tx.send(entry.clone()).is_ok());
    }
}

fn next_id_after(entries: &[ActivityLogEntry]) -> i64 {
    entries.iter().map(|e| e.id).max().map_or(1, |max| max + 1)
}
