//! Card storage trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::LexicardResult;
use crate::types::{Card, CardId, LearnerId, NewCard};

/// Persistence for cards.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Get a card by id.
    async fn get_by_id(&self, id: CardId) -> LexicardResult<Option<Card>>;

    /// Persist a new card and return it with its assigned id.
    async fn add(&self, card: NewCard) -> LexicardResult<Card>;

    /// Overwrite the repetition state of an existing card.
    async fn update(&self, card: &Card) -> LexicardResult<()>;

    /// All cards of a learner, oldest first.
    async fn list_by_learner(&self, learner_id: LearnerId) -> LexicardResult<Vec<Card>>;

    /// Non-learned cards whose next review is unset or at or before `now`.
    async fn due_candidates(
        &self,
        learner_id: LearnerId,
        now: DateTime<Utc>,
    ) -> LexicardResult<Vec<Card>>;

    /// All non-learned cards, regardless of when they are due.
    async fn active_candidates(&self, learner_id: LearnerId) -> LexicardResult<Vec<Card>>;

    /// Delete every card of a learner, returning how many were removed.
    async fn delete_all_by_learner(&self, learner_id: LearnerId) -> LexicardResult<usize>;
}
