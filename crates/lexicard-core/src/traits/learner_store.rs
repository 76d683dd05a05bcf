//! Learner storage trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::LexicardResult;
use crate::types::{ChatId, Learner, LearnerId};

/// Persistence for learners.
#[async_trait]
pub trait LearnerStore: Send + Sync {
    /// Get a learner by id.
    async fn get_by_id(&self, id: LearnerId) -> LexicardResult<Option<Learner>>;

    /// Get a learner by their chat identity.
    async fn get_by_chat(&self, chat_id: ChatId) -> LexicardResult<Option<Learner>>;

    /// Return the learner for `chat_id`, creating one with default settings if needed.
    ///
    /// `now` becomes `created_at` for a new learner.
    async fn get_or_create(
        &self,
        chat_id: ChatId,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> LexicardResult<Learner>;

    /// Overwrite the learner-owned fields (username and settings).
    async fn update(&self, learner: &Learner) -> LexicardResult<()>;

    /// Every learner, in id order.
    async fn list_all(&self) -> LexicardResult<Vec<Learner>>;

    /// Write only the reminder schedule.
    async fn set_next_reminder_at(
        &self,
        id: LearnerId,
        at: Option<DateTime<Utc>>,
    ) -> LexicardResult<()>;

    /// Write only the daily summary marker.
    async fn set_last_summary_on(&self, id: LearnerId, day: NaiveDate) -> LexicardResult<()>;
}
