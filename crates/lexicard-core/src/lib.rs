//! lexicard-core - Core library for lexicard.
//!
//! Spaced-repetition scheduling for vocabulary cards plus the reminder engine
//! that pushes cards and a daily digest to learners.
//!
//! # Example
//!
//! ```ignore
//! use lexicard_core::{CardService, SqliteStore, SystemClock};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::in_memory()?);
//! let cards = CardService::new(store.clone(), store.clone(), Arc::new(SystemClock));
//!
//! let card = cards.add_card(learner.id, "cat", "кот", None, None).await?;
//! cards.record_review(card.id, true).await?;
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod reminders;
pub mod scheduling;
pub mod services;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{LexicardConfig, NotifierConfig, RetryPolicy, SchedulerConfig};
pub use error::{ErrorCode, LexicardError, LexicardResult};
pub use notify::{TracingNotifier, WebhookNotifier};
pub use reminders::{
    DailySummaryTrigger, ReminderOutcome, ReminderScheduler, SchedulerLoop, SummaryOutcome,
    TickReport,
};
pub use scheduling::{interval_days, DueCardSelector, ReviewScheduler, ReviewTransition};
pub use services::{AppliedReview, CardService, LearnerService, ReviewOutcome, StatsService};
pub use store::SqliteStore;
pub use traits::{CardStore, Clock, LearnerStore, ManualClock, Markup, Notifier, ReviewLog, SystemClock};
pub use types::{
    BestDay, Card, CardId, ChatId, Learner, LearnerId, NewCard, NewReview, ReminderSettings,
    Review, TodayStats,
};
