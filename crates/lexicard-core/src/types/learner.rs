//! Learner record and reminder settings.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Learner identifier.
pub type LearnerId = i64;

/// External chat identity the notifier delivers to.
pub type ChatId = i64;

/// Default gap between proactive reminders for new learners.
pub const DEFAULT_REMINDER_INTERVAL_MINUTES: i32 = 60;

/// A learner and the state the reminder engine keeps for them.
///
/// `next_reminder_at` and `last_summary_on` are written only by the reminder
/// engine; the remaining settings belong to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learner {
    pub id: LearnerId,
    pub chat_id: ChatId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Configured reminder cadence. Values below one minute are floored when used.
    pub reminder_interval_minutes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_reminder_at: Option<DateTime<Utc>>,
    pub hide_translations: bool,
    /// UTC date the daily summary was last delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_summary_on: Option<NaiveDate>,
}

impl Learner {
    /// Create a learner with default settings.
    pub fn new(id: LearnerId, chat_id: ChatId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            chat_id,
            username: None,
            created_at,
            reminder_interval_minutes: DEFAULT_REMINDER_INTERVAL_MINUTES,
            next_reminder_at: None,
            hide_translations: true,
            last_summary_on: None,
        }
    }

    /// Reminder cadence with the one-minute floor applied.
    pub fn reminder_interval(&self) -> Duration {
        Duration::minutes(i64::from(self.reminder_interval_minutes.max(1)))
    }

    /// Whether the daily summary was already delivered on `day`.
    pub fn summary_sent_on(&self, day: NaiveDate) -> bool {
        self.last_summary_on == Some(day)
    }
}

/// Partial update of the learner-owned settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_translations: Option<bool>,
}

impl ReminderSettings {
    /// Settings change that only touches the reminder cadence.
    pub fn interval(minutes: i32) -> Self {
        Self {
            interval_minutes: Some(minutes),
            ..Default::default()
        }
    }

    /// Settings change that only touches translation visibility.
    pub fn hide_translations(hide: bool) -> Self {
        Self {
            hide_translations: Some(hide),
            ..Default::default()
        }
    }
}
