//! Aggregate learning statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day with the most reviews in a learner's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestDay {
    pub day: NaiveDate,
    pub reviews: u32,
}

/// A learner's activity for one UTC day plus collection totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStats {
    /// Cards created today.
    pub new_today: u32,
    /// Reviews recorded today.
    pub reviews_today: u32,
    /// Correct reviews recorded today.
    pub correct_today: u32,
    pub total_cards: u32,
    pub learned_cards: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_day: Option<BestDay>,
}

impl TodayStats {
    /// Share of correct reviews today, `None` when nothing was reviewed.
    pub fn accuracy_today(&self) -> Option<f32> {
        if self.reviews_today == 0 {
            return None;
        }
        Some(self.correct_today as f32 / self.reviews_today as f32)
    }
}
