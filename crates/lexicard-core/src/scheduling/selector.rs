//! Next-card selection.
//!
//! Two policies:
//! - due selection for practice sessions: only cards whose review time has come
//! - active selection for proactive reminders: any card not learned yet,
//!   ignoring the schedule on purpose
//!
//! Both draw uniformly at random from a caller-supplied RNG and return `None`
//! for an empty candidate set instead of drawing from it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::LexicardResult;
use crate::traits::CardStore;
use crate::types::{Card, LearnerId};

/// Chooses which card a learner sees next.
pub struct DueCardSelector {
    cards: Arc<dyn CardStore>,
}

impl DueCardSelector {
    pub fn new(cards: Arc<dyn CardStore>) -> Self {
        Self { cards }
    }

    /// Pick a random due card for an on-demand practice session.
    pub async fn due_card<R: Rng + Send + ?Sized>(
        &self,
        learner_id: LearnerId,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> LexicardResult<Option<Card>> {
        let candidates = self.cards.due_candidates(learner_id, now).await?;
        let picked = Self::pick_due(&candidates, now, rng).cloned();
        if picked.is_none() {
            debug!(learner_id, "No due cards");
        }
        Ok(picked)
    }

    /// Pick a random non-learned card regardless of its schedule.
    pub async fn random_active_card<R: Rng + Send + ?Sized>(
        &self,
        learner_id: LearnerId,
        rng: &mut R,
    ) -> LexicardResult<Option<Card>> {
        let candidates = self.cards.active_candidates(learner_id).await?;
        let picked = Self::pick_active(&candidates, rng).cloned();
        if picked.is_none() {
            debug!(learner_id, "No active cards");
        }
        Ok(picked)
    }

    /// Uniform draw among the cards of `cards` that are due at `now`.
    pub fn pick_due<'a, R: Rng + ?Sized>(
        cards: &'a [Card],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<&'a Card> {
        let due: Vec<&Card> = cards.iter().filter(|c| c.is_due(now)).collect();
        due.choose(rng).copied()
    }

    /// Uniform draw among the non-learned cards of `cards`.
    pub fn pick_active<'a, R: Rng + ?Sized>(cards: &'a [Card], rng: &mut R) -> Option<&'a Card> {
        let active: Vec<&Card> = cards.iter().filter(|c| !c.learned).collect();
        active.choose(rng).copied()
    }
}
