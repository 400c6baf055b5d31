//! Desk configuration.
//!
//! Every field has a default, so a host only supplies what it overrides.
//! Overrides are read from the `desk_config` store key on start, or from a
//! JSON file the host passes in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::{setting_keys, Database, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeskConfig {
    /// Rows per list page
    pub page_size: usize,
    /// Newest activity entries kept after every append
    pub log_retention_cap: usize,
    /// Newest activity entries kept by the "clear old logs" maintenance action
    pub log_maintenance_keep: usize,
    /// Months shown by the dashboard trend charts, current month included
    pub trend_months: u32,
    /// Minimum spacing between unread-count polls
    pub unread_poll_interval_secs: u64,
    /// Maximum patients returned by the report patient picker
    pub report_patient_search_limit: usize,
    /// Operator label used when the host has not set one
    pub default_operator: String,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            log_retention_cap: 500,
            log_maintenance_keep: 100,
            trend_months: 6,
            unread_poll_interval_secs: 5,
            report_patient_search_limit: 50,
            default_operator: "Admin".to_string(),
        }
    }
}

impl DeskConfig {
    /// Parse overrides from JSON text. Unusable values fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Load overrides stored in the database, falling back to defaults.
    pub fn load(db: &Database) -> DbResult<Self> {
        let config = db.load_value::<DeskConfig>(setting_keys::DESK_CONFIG)?;
        Ok(config.unwrap_or_default().sanitized())
    }

    /// Persist this configuration.
    pub fn save(&self, db: &Database) -> DbResult<()> {
        db.save_value(setting_keys::DESK_CONFIG, self)
    }

    pub fn unread_poll_interval(&self) -> Duration {
        Duration::from_secs(self.unread_poll_interval_secs)
    }

    /// Replace values that would break the engines with their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = DeskConfig::default();
        if self.page_size == 0 {
            warn!("page_size must be positive, using default");
            self.page_size = defaults.page_size;
        }
        if self.log_retention_cap == 0 {
            warn!("log_retention_cap must be positive, using default");
            self.log_retention_cap = defaults.log_retention_cap;
        }
        if self.trend_months == 0 {
            warn!("trend_months must be positive, using default");
            self.trend_months = defaults.trend_months;
        }
        if self.default_operator.trim().is_empty() {
            self.default_operator = defaults.default_operator;
        }
        self
    }
}
