//! The clinic desk service.
//!
//! [`ClinicDesk`] owns the record store, the activity log and the current
//! operator label. Every mutating operation loads the collections it needs,
//! changes them in memory, saves them back and appends an activity entry.

mod appointments;
mod catalog;
mod invoices;
mod patients;
mod views;

pub use catalog::TreatmentForm;

use std::path::Path;
use std::sync::mpsc::Receiver;

use tracing::{debug, info};

use crate::activity::{ActivityLog, UnreadPoller};
use crate::config::DeskConfig;
use crate::db::Database;
use crate::error::{DeskError, DeskResult};
use crate::models::{ActivityLogEntry, NewLogEntry, Record, StatusTransitions};

pub struct ClinicDesk {
    db: Database,
    log: ActivityLog,
    config: DeskConfig,
    operator: String,
    transitions: StatusTransitions,
}

impl ClinicDesk {
    /// Open the desk on a database file, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DeskResult<Self> {
        Self::with_database(Database::open(path)?)
    }

    pub fn open_in_memory() -> DeskResult<Self> {
        Self::with_database(Database::open_in_memory()?)
    }

    /// Start the desk on an opened database.
    ///
    /// Loads stored configuration and recovers the activity log counter.
    pub fn with_database(db: Database) -> DeskResult<Self> {
        let config = DeskConfig::load(&db)?;
        let log = ActivityLog::recover(&db, &config)?;
        let operator = config.default_operator.clone();
        info!(operator = %operator, next_log_id = log.next_id(), "Clinic desk ready");

        Ok(Self {
            db,
            log,
            config,
            operator,
            transitions: StatusTransitions::default(),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn current_operator(&self) -> &str {
        &self.operator
    }

    /// Change the operator label stamped on new activity entries.
    ///
    /// A blank name resets to the configured default.
    pub fn set_current_operator(&mut self, name: &str) {
        let name = name.trim();
        self.operator = if name.is_empty() {
            self.config.default_operator.clone()
        } else {
            name.to_string()
        };
        debug!(operator = %self.operator, "Current operator changed");
    }

    pub fn status_transitions(&self) -> &StatusTransitions {
        &self.transitions
    }

    pub fn set_status_transitions(&mut self, transitions: StatusTransitions) {
        self.transitions = transitions;
    }

    // =========================================================================
    // Activity log
    // =========================================================================

    pub fn activity_log(&self) -> DeskResult<Vec<ActivityLogEntry>> {
        Ok(self.log.entries(&self.db)?)
    }

    pub fn unread_count(&self) -> DeskResult<usize> {
        Ok(self.log.unread_count(&self.db)?)
    }

    pub fn mark_logs_read(&self) -> DeskResult<Option<i64>> {
        Ok(self.log.mark_read(&self.db)?)
    }

    /// Keep only the newest entries allowed by the maintenance limit.
    pub fn clear_old_logs(&self) -> DeskResult<usize> {
        Ok(self.log.clear_old(&self.db)?)
    }

    /// Receive every activity entry appended from now on.
    pub fn subscribe(&mut self) -> Receiver<ActivityLogEntry> {
        self.log.subscribe()
    }

    /// A poller for hosts that cannot hold a subscription.
    pub fn unread_poller(&self) -> UnreadPoller {
        UnreadPoller::new(self.config.unread_poll_interval())
    }

    /// Poll the unread count, coalescing calls inside the poll interval.
    pub fn poll_unread(&self, poller: &mut UnreadPoller) -> DeskResult<Option<usize>> {
        Ok(poller.poll(&self.log, &self.db, std::time::Instant::now())?)
    }

    fn record_activity(&mut self, entry: NewLogEntry) -> DeskResult<ActivityLogEntry> {
        Ok(self.log.append(&self.db, entry, &self.operator)?)
    }
}

/// Index of the record with `id`, or NotFound.
fn position<T: Record>(records: &[T], entity: &'static str, id: i64) -> DeskResult<usize> {
    records
        .iter()
        .position(|r| r.id() == id)
        .ok_or_else(|| DeskError::not_found(entity, id))
}

/// Trimmed text, or ValidationFailed when blank.
fn required(value: &str, message: &str) -> DeskResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DeskError::invalid(message));
    }
    Ok(value.to_string())
}

/// Trimmed text, or `None` when blank.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
