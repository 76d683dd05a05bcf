//! Plain-text message bodies.
//!
//! Output is transport-neutral: anything that should be hidden is reported
//! through [`Markup`] spoilers rather than formatting characters.

use std::fmt::Write;

use crate::traits::Markup;
use crate::types::{Card, TodayStats};

/// A rendered message and its presentation hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub markup: Option<Markup>,
}

impl Message {
    fn new(text: String, spoilers: Vec<String>) -> Self {
        let markup = Markup::spoilers(spoilers);
        Self {
            text,
            markup: (!markup.is_empty()).then_some(markup),
        }
    }
}

/// Proactive reminder: `"{term} — {translation}"`.
pub fn render_reminder(card: &Card, hide_translation: bool) -> Message {
    let text = format!("{} — {}", card.term, card.translation);
    let spoilers = if hide_translation {
        vec![card.translation.clone()]
    } else {
        Vec::new()
    };
    Message::new(text, spoilers)
}

/// Card shown during an on-demand practice session.
pub fn render_practice_card(card: &Card, hide_translation: bool) -> Message {
    let mut text = format!("Word: {}", card.term);
    if !card.transcription.is_empty() {
        let _ = write!(text, " [{}]", card.transcription);
    }
    let _ = write!(text, "\nTranslation: {}", card.translation);

    let mut spoilers = Vec::new();
    if hide_translation {
        spoilers.push(card.translation.clone());
    }

    if let Some(example) = card.example.as_deref().filter(|e| !e.trim().is_empty()) {
        let _ = write!(text, "\nExample: {}", example);
        if hide_translation {
            spoilers.push(example.to_string());
        }
    }

    Message::new(text, spoilers)
}

/// End-of-day digest.
pub fn render_daily_summary(stats: &TodayStats) -> Message {
    let mut text = String::from("Daily summary\n\n");
    let _ = writeln!(text, "New words today: {}", stats.new_today);
    let _ = write!(
        text,
        "Reviews today: {} (correct: {})",
        stats.reviews_today, stats.correct_today
    );
    if let Some(accuracy) = stats.accuracy_today() {
        let _ = write!(text, ", accuracy {:.0}%", accuracy * 100.0);
    }
    let _ = write!(
        text,
        "\n\nTotal cards: {}\nLearned: {}",
        stats.total_cards, stats.learned_cards
    );
    if let Some(best) = stats.best_day {
        let _ = write!(
            text,
            "\n\nBest day: {} — {} reviews",
            best.day.format("%Y-%m-%d"),
            best.reviews
        );
    }
    Message::new(text, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BestDay, NewCard};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn cat() -> Card {
        NewCard::new(1, "cat", "кот", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).into_card(1)
    }

    #[test]
    fn test_reminder_hides_translation() {
        let message = render_reminder(&cat(), true);
        assert_eq!(message.text, "cat — кот");
        assert_eq!(message.markup, Some(Markup::spoilers(["кот"])));
    }

    #[test]
    fn test_reminder_shows_translation() {
        let message = render_reminder(&cat(), false);
        assert_eq!(message.text, "cat — кот");
        assert!(message.markup.is_none());
    }

    #[test]
    fn test_practice_card_with_example() {
        let mut card = cat();
        card.transcription = "kæt".into();
        card.example = Some("The cat sleeps.".into());

        let message = render_practice_card(&card, true);
        assert_eq!(
            message.text,
            "Word: cat [kæt]\nTranslation: кот\nExample: The cat sleeps."
        );
        assert_eq!(
            message.markup,
            Some(Markup::spoilers(["кот", "The cat sleeps."]))
        );
    }

    #[test]
    fn test_practice_card_skips_blank_example() {
        let mut card = cat();
        card.example = Some("  ".into());
        let message = render_practice_card(&card, false);
        assert_eq!(message.text, "Word: cat\nTranslation: кот");
    }

    #[test]
    fn test_daily_summary() {
        let stats = TodayStats {
            new_today: 2,
            reviews_today: 4,
            correct_today: 3,
            total_cards: 10,
            learned_cards: 1,
            best_day: Some(BestDay {
                day: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                reviews: 12,
            }),
        };

        let message = render_daily_summary(&stats);
        assert!(message.text.contains("New words today: 2"));
        assert!(message.text.contains("Reviews today: 4 (correct: 3), accuracy 75%"));
        assert!(message.text.contains("Learned: 1"));
        assert!(message.text.ends_with("Best day: 2024-03-05 — 12 reviews"));
        assert!(message.markup.is_none());
    }

    #[test]
    fn test_daily_summary_without_activity() {
        let message = render_daily_summary(&TodayStats::default());
        assert!(message.text.contains("Reviews today: 0 (correct: 0)\n"));
        assert!(!message.text.contains("accuracy"));
        assert!(!message.text.contains("Best day"));
    }
}
