//! Card lifecycle: creation, review recording, practice selection.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{LexicardError, LexicardResult};
use crate::scheduling::{DueCardSelector, ReviewScheduler, SharedRng};
use crate::traits::{CardStore, Clock, ReviewLog};
use crate::types::{Card, CardId, LearnerId, NewCard, NewReview, Review};

/// What happened to a review result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The card no longer exists; nothing was changed.
    CardNotFound(CardId),
    /// The card was updated.
    Applied(AppliedReview),
}

/// A review whose effect on the card has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReview {
    pub card: Card,
    /// Entry that was (or should be) appended to the review log.
    pub review: NewReview,
    /// The appended entry, `None` if the log write failed. The caller may
    /// retry with [`ReviewLog::append`] and `review`.
    pub logged: Option<Review>,
    pub just_learned: bool,
}

/// Application service for a learner's cards.
pub struct CardService {
    cards: Arc<dyn CardStore>,
    reviews: Arc<dyn ReviewLog>,
    clock: Arc<dyn Clock>,
    scheduler: ReviewScheduler,
    selector: DueCardSelector,
    rng: SharedRng,
}

impl CardService {
    pub fn new(cards: Arc<dyn CardStore>, reviews: Arc<dyn ReviewLog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            selector: DueCardSelector::new(Arc::clone(&cards)),
            cards,
            reviews,
            clock,
            scheduler: ReviewScheduler::new(),
            rng: SharedRng::default(),
        }
    }

    /// Builder: use a fixed seed for practice-card selection.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = SharedRng::new(Some(seed));
        self
    }

    /// Add a card, or return the learner's existing card with the same term.
    ///
    /// Terms are compared case-insensitively after trimming.
    pub async fn add_card(
        &self,
        learner_id: LearnerId,
        term: &str,
        translation: &str,
        transcription: Option<&str>,
        example: Option<&str>,
    ) -> LexicardResult<Card> {
        let term = term.trim();
        let translation = translation.trim();
        if term.is_empty() || translation.is_empty() {
            return Err(LexicardError::validation(
                "term and translation must not be empty",
            ));
        }

        let wanted = term.to_lowercase();
        let existing = self.cards.list_by_learner(learner_id).await?;
        if let Some(card) = existing
            .into_iter()
            .find(|c| c.term.trim().to_lowercase() == wanted)
        {
            debug!(learner_id, card_id = card.id, "Card already exists");
            return Ok(card);
        }

        let mut new_card = NewCard::new(learner_id, term, translation, self.clock.now());
        if let Some(transcription) = transcription.map(str::trim).filter(|t| !t.is_empty()) {
            new_card = new_card.with_transcription(transcription);
        }
        if let Some(example) = example.map(str::trim).filter(|e| !e.is_empty()) {
            new_card = new_card.with_example(example);
        }

        let card = self.cards.add(new_card).await?;
        info!(learner_id, card_id = card.id, "Card added");
        Ok(card)
    }

    /// Apply a review result to a card.
    ///
    /// A card that is missing, or disappears before the update lands, yields
    /// [`ReviewOutcome::CardNotFound`] and nothing is logged.
    ///
    /// The card update and the log append are separate writes. A failed append
    /// is logged and reported through [`AppliedReview::logged`]; the card
    /// update is not rolled back.
    pub async fn record_review(&self, card_id: CardId, is_correct: bool) -> LexicardResult<ReviewOutcome> {
        let Some(card) = self.cards.get_by_id(card_id).await? else {
            warn!(card_id, "Review for unknown card ignored");
            return Ok(ReviewOutcome::CardNotFound(card_id));
        };

        let transition = self.scheduler.apply_review(&card, is_correct, self.clock.now());
        match self.cards.update(&transition.card).await {
            Ok(()) => {}
            Err(LexicardError::NotFound { .. }) => {
                warn!(card_id, "Card removed before review was saved");
                return Ok(ReviewOutcome::CardNotFound(card_id));
            }
            Err(e) => return Err(e),
        }

        let logged = match self.reviews.append(transition.review).await {
            Ok(review) => Some(review),
            Err(e) => {
                warn!(card_id, error = %e, "Failed to append review log entry");
                None
            }
        };

        if transition.just_learned() {
            info!(card_id, learner_id = card.learner_id, "Card learned");
        }

        Ok(ReviewOutcome::Applied(AppliedReview {
            just_learned: transition.just_learned(),
            card: transition.card,
            review: transition.review,
            logged,
        }))
    }

    /// Random card due for practice, if any.
    pub async fn next_due_card(&self, learner_id: LearnerId) -> LexicardResult<Option<Card>> {
        let mut rng = self.rng.fork();
        self.selector
            .due_card(learner_id, self.clock.now(), &mut rng)
            .await
    }

    pub async fn list_cards(&self, learner_id: LearnerId) -> LexicardResult<Vec<Card>> {
        self.cards.list_by_learner(learner_id).await
    }

    /// Delete all of a learner's cards.
    pub async fn clear_cards(&self, learner_id: LearnerId) -> LexicardResult<usize> {
        let deleted = self.cards.delete_all_by_learner(learner_id).await?;
        info!(learner_id, deleted, "Cards cleared");
        Ok(deleted)
    }
}
