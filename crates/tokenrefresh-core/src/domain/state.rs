//! Runtime refresh state published by the scheduler.
//!
//! Never persisted.  The scheduler is the only writer; observers get copies.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A point-in-time view of the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSnapshot {
    /// Whether a refresh loop is currently scheduled.
    pub running: bool,
    /// Number of completed refresh cycles, successful or not.
    pub refresh_count: u64,
    /// When the last cycle completed; `None` before the first one.
    pub last_refresh_time: Option<DateTime<Utc>>,
}

impl RefreshSnapshot {
    /// Records a completed cycle.
    pub fn record_cycle(&mut self, at: DateTime<Utc>) {
        self.refresh_count += 1;
        self.last_refresh_time = Some(at);
    }

    /// Human-readable "last refreshed" text: `never` or an RFC 3339 timestamp.
    pub fn last_refresh_display(&self) -> String {
        match self.last_refresh_time {
            Some(at) => at.to_rfc3339(),
            None => "never".to_string(),
        }
    }
}
