//! Vocabulary card and its repetition state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::LearnerId;
use crate::scheduling::interval_days;

/// Card identifier.
pub type CardId = i64;

/// Level a freshly created card starts at.
pub const INITIAL_LEVEL: u32 = 1;

/// Highest level that is still scheduled for review. A correct answer at
/// this level moves the card to `LEARNED_LEVEL`.
pub const MAX_LEVEL: u32 = 10;

/// Level recorded on a card once it has been learned.
pub const LEARNED_LEVEL: u32 = MAX_LEVEL + 1;

/// A single vocabulary item tracked per learner.
///
/// Invariants maintained by [`crate::scheduling::ReviewScheduler`]:
/// - `learned` implies `next_review_at.is_none()`
/// - `level` stays in `1..=LEARNED_LEVEL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub learner_id: LearnerId,
    pub term: String,
    pub translation: String,
    pub transcription: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub level: u32,
    pub learned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review_at: Option<DateTime<Utc>>,
    pub total_reviews: u32,
    pub correct_reviews: u32,
}

impl Card {
    /// Whether the card should be presented for revision at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.learned && self.next_review_at.map_or(true, |at| at <= now)
    }

    /// Share of correct answers, `None` before the first review.
    pub fn accuracy(&self) -> Option<f32> {
        if self.total_reviews == 0 {
            return None;
        }
        Some(self.correct_reviews as f32 / self.total_reviews as f32)
    }
}

/// A card that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub learner_id: LearnerId,
    pub term: String,
    pub translation: String,
    pub transcription: String,
    pub example: Option<String>,
    pub level: u32,
    pub next_review_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewCard {
    /// Build a card at the first level, due one interval after `now`.
    pub fn new(
        learner_id: LearnerId,
        term: impl Into<String>,
        translation: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            learner_id,
            term: term.into(),
            translation: translation.into(),
            transcription: String::new(),
            example: None,
            level: INITIAL_LEVEL,
            next_review_at: Some(now + Duration::days(interval_days(INITIAL_LEVEL as i64))),
            created_at: now,
        }
    }

    /// Builder: set the transcription.
    pub fn with_transcription(mut self, transcription: impl Into<String>) -> Self {
        self.transcription = transcription.into();
        self
    }

    /// Builder: set a usage example.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Attach the id assigned by the store.
    pub fn into_card(self, id: CardId) -> Card {
        Card {
            id,
            learner_id: self.learner_id,
            term: self.term,
            translation: self.translation,
            transcription: self.transcription,
            example: self.example,
            level: self.level,
            learned: false,
            next_review_at: self.next_review_at,
            created_at: self.created_at,
            last_review_at: None,
            total_reviews: 0,
            correct_reviews: 0,
        }
    }
}
