//! Append-only review log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CardId;

/// Review log entry identifier.
pub type ReviewId = i64;

/// One recorded review outcome. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub card_id: CardId,
    pub is_correct: bool,
    pub reviewed_at: DateTime<Utc>,
}

/// A review outcome that has not been appended to the log yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewReview {
    pub card_id: CardId,
    pub is_correct: bool,
    pub reviewed_at: DateTime<Utc>,
}

impl NewReview {
    /// Attach the id assigned by the log.
    pub fn into_review(self, id: ReviewId) -> Review {
        Review {
            id,
            card_id: self.card_id,
            is_correct: self.is_correct,
            reviewed_at: self.reviewed_at,
        }
    }
}
