//! Inactivity tracking

use std::time::Duration;

/// Tracks time since the last phase change
pub struct InactivityMonitor {
    timeout: Duration,
    last_change_ms: Option<u64>,
}

impl InactivityMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_change_ms: None,
        }
    }

    /// Check a frame timestamp against the timeout.
    ///
    /// Returns `true` when more than `timeout` passed since the last phase
    /// change; the idle clock then restarts at `now_ms`. The first frame
    /// seen starts the clock.
    pub fn check(&mut self, now_ms: u64) -> bool {
        match self.last_change_ms {
            None => {
                self.last_change_ms = Some(now_ms);
                false
            }
            Some(last) => {
                if self.idle_for(now_ms) > self.timeout {
                    self.last_change_ms = Some(now_ms.max(last));
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a phase change at `now_ms`
    pub fn record_change(&mut self, now_ms: u64) {
        self.last_change_ms = Some(now_ms);
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time since the last phase change
    pub fn idle_for(&self, now_ms: u64) -> Duration {
        self.last_change_ms
            .map(|last| Duration::from_millis(now_ms.saturating_sub(last)))
            .unwrap_or_default()
    }
}
