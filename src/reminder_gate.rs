//! Throttle for the "back up your diary" nudge.
//!
//! The gate only remembers when the user was last asked. Dismissing the
//! reminder and actually exporting both reset the timer the same way, and
//! nothing here looks at the dataset's `lastBackupDate`.

use chrono::{DateTime, Duration, TimeZone, Utc};

pub const BACKUP_REMINDER_INTERVAL_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderGate {
    last_prompted_at: Option<DateTime<Utc>>,
    interval: Duration,
}

impl Default for ReminderGate {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ReminderGate {
    pub fn new(last_prompted_at: Option<DateTime<Utc>>) -> Self {
        Self {
            last_prompted_at,
            interval: Duration::milliseconds(BACKUP_REMINDER_INTERVAL_MS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Rebuilds the gate from the stored epoch-millisecond stamp.
    pub fn from_stamp(stamp: Option<i64>) -> Self {
        Self::new(stamp.and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
    }

    pub fn to_stamp(&self) -> Option<i64> {
        self.last_prompted_at.map(|at| at.timestamp_millis())
    }

    pub fn last_prompted_at(&self) -> Option<DateTime<Utc>> {
        self.last_prompted_at
    }

    pub fn should_prompt(&self) -> bool {
        self.should_prompt_at(Utc::now())
    }

    /// True when never prompted, or when strictly more than the interval has
    /// elapsed since the last prompt.
    pub fn should_prompt_at(&self, now: DateTime<Utc>) -> bool {
        match self.last_prompted_at {
            None => true,
            Some(last) => now.signed_duration_since(last) > self.interval,
        }
    }

    pub fn mark_prompted(&mut self) {
        self.mark_prompted_at(Utc::now());
    }

    pub fn mark_prompted_at(&mut self, now: DateTime<Utc>) {
        self.last_prompted_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.last_prompted_at = None;
    }
}
