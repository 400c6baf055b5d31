//! Polling fallback for unread counts.
//!
//! Hosts that cannot subscribe to log appends call [`UnreadPoller::poll`] on
//! a timer. Calls closer together than the interval are coalesced, so the
//! store is read at most once per interval no matter how often the host asks.

use std::time::{Duration, Instant};

use crate::db::{Database, DbResult};

use super::ActivityLog;

pub struct UnreadPoller {
    interval: Duration,
    last_poll: Option<Instant>,
}

impl UnreadPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_poll: None,
        }
    }

    /// Re-read the unread count when the interval has elapsed.
    ///
    /// Returns `None` for a coalesced call.
    pub fn poll(
        &mut self,
        log: &ActivityLog,
        db: &Database,
        now: Instant,
    ) -> DbResult<Option<usize>> {
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < self.interval {
                return Ok(None);
            }
        }

        let count = log.unread_count(db)?;
        self.last_poll = Some(now);
        Ok(Some(count))
    }
}
