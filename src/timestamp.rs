//! Monotonic time enforcement
//!
//! Stored rows must never go back in time. A record whose timestamp is below
//! the last accepted one is kept, but its timestamp is overwritten with the last
//! accepted value and a corrupt-time event is counted. Logs with broken clocks
//! can produce thousands of these, so only the first few are logged in detail.

use tracing::warn;

use crate::types::{LoadingStatus, NameValuePair, Value};

/// Detailed warnings emitted before suppression when nothing else is configured.
pub const DEFAULT_WARNING_LIMIT: usize = 50;

/// What to log for the next occurrence of a repeated warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningDecision {
    /// Log the full message
    Detailed,
    /// Log once that further messages are suppressed
    Suppress,
    /// Log nothing
    Silent,
}

/// Counts occurrences of a warning and decides how loudly to report each.
#[derive(Debug, Clone)]
pub struct WarningLimiter {
    limit: usize,
    seen: usize,
}

impl WarningLimiter {
    pub fn new(limit: usize) -> Self {
        Self { limit, seen: 0 }
    }

    /// Register one more occurrence.
    pub fn record(&mut self) -> WarningDecision {
        let decision = match self.seen {
            n if n < self.limit => WarningDecision::Detailed,
            n if n == self.limit => WarningDecision::Suppress,
            _ => WarningDecision::Silent,
        };
        self.seen = self.seen.saturating_add(1);
        decision
    }

    /// Occurrences registered so far.
    pub fn seen(&self) -> usize {
        self.seen
    }
}

impl Default for WarningLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_LIMIT)
    }
}

/// Result of checking one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCheck {
    /// The value was not below the last valid one and is now the last valid one
    Accepted(u64),
    /// The value went backwards and was replaced
    Clamped { found: u64, replacement: u64, warning: WarningDecision },
}

/// Tracks the last valid timestamp of a session.
#[derive(Debug, Clone, Default)]
pub struct TimestampGuard {
    last_valid: u64,
    limiter: WarningLimiter,
}

impl TimestampGuard {
    pub fn new(warning_limit: usize) -> Self {
        Self { last_valid: 0, limiter: WarningLimiter::new(warning_limit) }
    }

    /// The largest timestamp accepted so far, 0 before the first one.
    pub fn last_valid(&self) -> u64 {
        self.last_valid
    }

    /// Check a raw timestamp against the last valid one.
    pub fn check(&mut self, value: u64) -> TimeCheck {
        if value >= self.last_valid {
            self.last_valid = value;
            TimeCheck::Accepted(value)
        } else {
            TimeCheck::Clamped {
                found: value,
                replacement: self.last_valid,
                warning: self.limiter.record(),
            }
        }
    }

    /// Check the timestamp at `index` of a decoded record and clamp it in place.
    ///
    /// Values that are not unsigned integers read as 0. Every regression is
    /// counted on `status`; the log output is rate limited.
    pub fn extract_and_clamp(
        &mut self,
        values: &mut [NameValuePair],
        index: usize,
        type_name: &str,
        status: &mut LoadingStatus,
    ) -> TimeCheck {
        let Some(field) = values.get_mut(index) else {
            return TimeCheck::Accepted(self.last_valid);
        };
        let value = field.value.as_u64().unwrap_or(0);

        let check = self.check(value);
        if let TimeCheck::Clamped { found, replacement, warning } = check {
            let message = format!(
                "Corrupt time in {type_name} data: {found} is before the previous time {replacement}. \
                 Using the previous time."
            );
            match warning {
                WarningDecision::Detailed => {
                    warn!(name = %type_name, found, replacement, "Corrupt time in data record")
                }
                WarningDecision::Suppress => warn!(
                    limit = self.limiter.limit,
                    "Suppressing further time corruption warnings"
                ),
                WarningDecision::Silent => {}
            }
            status.corrupt_time_read(message);
            field.value = Value::UInt64(replacement);
        }
        check
    }
}
