//! Review outcome state machine.
//!
//! A correct answer climbs one level; an incorrect one drops a level (never
//! below the first). Climbing past [`MAX_LEVEL`] marks the card learned and
//! removes it from the schedule.

use chrono::{DateTime, Duration, Utc};

use super::interval_days;
use crate::types::{Card, NewReview, INITIAL_LEVEL, LEARNED_LEVEL, MAX_LEVEL};

/// Result of applying one review to a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTransition {
    /// Card with its new repetition state.
    pub card: Card,
    /// Log entry to append for this review.
    pub review: NewReview,
    /// Level before the review.
    pub previous_level: u32,
}

impl ReviewTransition {
    /// Whether this review moved the card into the learned state.
    pub fn just_learned(&self) -> bool {
        self.card.learned && self.previous_level <= MAX_LEVEL
    }
}

/// Applies review outcomes to cards.
///
/// Not idempotent: every call is a distinct review event and advances the
/// counters again.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewScheduler;

impl ReviewScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Apply a single review outcome observed at `now`.
    pub fn apply_review(&self, card: &Card, is_correct: bool, now: DateTime<Utc>) -> ReviewTransition {
        let previous_level = card.level;
        let mut next = card.clone();

        next.total_reviews += 1;
        if is_correct {
            next.correct_reviews += 1;
        }

        // The level must move before the interval lookup that depends on it.
        if is_correct {
            next.level = (card.level + 1).min(LEARNED_LEVEL);
            if next.level > MAX_LEVEL {
                next.learned = true;
                next.next_review_at = None;
            } else {
                next.next_review_at = Some(now + Duration::days(interval_days(next.level as i64)));
            }
        } else {
            next.level = card.level.saturating_sub(1).max(INITIAL_LEVEL);
            next.learned = false;
            next.next_review_at = Some(now + Duration::days(interval_days(next.level as i64)));
        }

        next.last_review_at = Some(now);

        ReviewTransition {
            review: NewReview {
                card_id: card.id,
                is_correct,
                reviewed_at: now,
            },
            card: next,
            previous_level,
        }
    }
}
