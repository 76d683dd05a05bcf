use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::LexicardResult;
use crate::traits::{CardStore, ReviewLog};
use crate::types::{LearnerId, TodayStats};

/// Aggregates a learner's activity for the daily digest.
pub struct StatsService {
    cards: Arc<dyn CardStore>,
    reviews: Arc<dyn ReviewLog>,
}

impl StatsService {
    pub fn new(cards: Arc<dyn CardStore>, reviews: Arc<dyn ReviewLog>) -> Self {
        Self { cards, reviews }
    }

    /// Statistics for the UTC day containing `now`.
    pub async fn today(&self, learner_id: LearnerId, now: DateTime<Utc>) -> LexicardResult<TodayStats> {
        let today = now.date_naive();
        let cards = self.cards.list_by_learner(learner_id).await?;
        let (reviews_today, correct_today) = self.reviews.day_stats(learner_id, today).await?;
        let best_day = self.reviews.best_day(learner_id).await?;

        Ok(TodayStats {
            new_today: cards.iter().filter(|c| c.created_at.date_naive() == today).count() as u32,
            reviews_today,
            correct_today,
            total_cards: cards.len() as u32,
            learned_cards: cards.iter().filter(|c| c.learned).count() as u32,
            best_day,
        })
    }
}
