//! Reminder engine: proactive reminders, the daily digest and the loop that
//! drives both.

mod reminder;
mod summary;
mod worker;

pub use reminder::{ReminderOutcome, ReminderScheduler};
pub use summary::{within_window, DailySummaryTrigger, SummaryOutcome};
pub use worker::{SchedulerLoop, TickReport};
