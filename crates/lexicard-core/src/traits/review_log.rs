//! Review log trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::LexicardResult;
use crate::types::{BestDay, LearnerId, NewReview, Review};

/// Append-only log of review outcomes.
#[async_trait]
pub trait ReviewLog: Send + Sync {
    /// Append one review outcome.
    async fn append(&self, review: NewReview) -> LexicardResult<Review>;

    /// `(total, correct)` reviews of a learner's cards on the given UTC day.
    async fn day_stats(&self, learner_id: LearnerId, day: NaiveDate) -> LexicardResult<(u32, u32)>;

    /// The UTC day with the most reviews, if the learner ever reviewed.
    async fn best_day(&self, learner_id: LearnerId) -> LexicardResult<Option<BestDay>>;
}
