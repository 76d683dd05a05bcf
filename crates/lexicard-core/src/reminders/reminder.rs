//! Per-learner proactive reminders.
//!
//! The whole state lives in `Learner::next_reminder_at`:
//!
//! ```text
//! None ──arm──▶ Some(t > now) ──time passes──▶ Some(t <= now) ──fire──▶ Some(now + interval)
//! ```
//!
//! Arming never sends. Firing always reschedules, even when the learner has
//! no card to show, so a learner cannot get stuck in the due state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::LexicardResult;
use crate::notify::render_reminder;
use crate::scheduling::{DueCardSelector, SharedRng};
use crate::traits::{CardStore, LearnerStore, Notifier};
use crate::types::{CardId, Learner};

/// What a reminder tick did for one learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// First tick: schedule armed, nothing sent.
    Armed { next: DateTime<Utc> },
    /// Reminder not due yet.
    NotDue { next: DateTime<Utc> },
    /// A reminder was sent and the next one scheduled.
    Sent { card_id: CardId, next: DateTime<Utc> },
    /// Due, but no active card; the next one is scheduled anyway.
    NothingToSend { next: DateTime<Utc> },
}

impl ReminderOutcome {
    pub fn sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Decides when each learner gets a reminder and sends it.
pub struct ReminderScheduler {
    learners: Arc<dyn LearnerStore>,
    selector: DueCardSelector,
    notifier: Arc<dyn Notifier>,
    rng: SharedRng,
}

impl ReminderScheduler {
    pub fn new(
        learners: Arc<dyn LearnerStore>,
        cards: Arc<dyn CardStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            learners,
            selector: DueCardSelector::new(cards),
            notifier,
            rng: SharedRng::default(),
        }
    }

    /// Builder: use a fixed seed for reminder card selection.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = SharedRng::new(Some(seed));
        self
    }

    /// Run one reminder step for `learner` at `now`.
    ///
    /// A failed send leaves the schedule untouched, so the learner is retried
    /// on the next tick.
    pub async fn tick(&self, learner: &Learner, now: DateTime<Utc>) -> LexicardResult<ReminderOutcome> {
        let Some(due_at) = learner.next_reminder_at else {
            let next = now + learner.reminder_interval();
            self.learners.set_next_reminder_at(learner.id, Some(next)).await?;
            debug!(learner_id = learner.id, %next, "Reminder armed");
            return Ok(ReminderOutcome::Armed { next });
        };

        if now < due_at {
            return Ok(ReminderOutcome::NotDue { next: due_at });
        }

        let mut rng = self.rng.fork();
        let card = self.selector.random_active_card(learner.id, &mut rng).await?;

        let sent = match card {
            Some(card) => {
                let message = render_reminder(&card, learner.hide_translations);
                self.notifier
                    .send(learner.chat_id, &message.text, message.markup.as_ref())
                    .await?;
                Some(card.id)
            }
            None => None,
        };

        let next = now + learner.reminder_interval();
        self.learners.set_next_reminder_at(learner.id, Some(next)).await?;

        Ok(match sent {
            Some(card_id) => {
                debug!(learner_id = learner.id, card_id, notifier = self.notifier.name(), %next, "Reminder sent");
                ReminderOutcome::Sent { card_id, next }
            }
            None => {
                debug!(learner_id = learner.id, %next, "Reminder due but no active cards");
                ReminderOutcome::NothingToSend { next }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexicardError;
    use crate::store::SqliteStore;
    use crate::traits::Markup;
    use crate::types::{ChatId, NewCard};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<(ChatId, String, Option<Markup>)>>,
        fail: bool,
    }

    impl MockNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<(ChatId, String, Option<Markup>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, chat_id: ChatId, text: &str, markup: Option<&Markup>) -> LexicardResult<()> {
            if self.fail {
                return Err(LexicardError::notification("gateway down"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat_id, text.to_string(), markup.cloned()));
            Ok(())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap()
    }

    async fn setup(notifier: Arc<MockNotifier>, interval: i32) -> (Arc<SqliteStore>, ReminderScheduler, Learner) {
        let store = Arc::new(SqliteStore::in_memory().unwrap().with_default_reminder_interval(interval));
        let learner = store.get_or_create(500, None, t0()).await.unwrap();
        let scheduler = ReminderScheduler::new(store.clone(), store.clone(), notifier).with_rng_seed(11);
        (store, scheduler, learner)
    }

    async fn reload(store: &SqliteStore, learner: &Learner) -> Learner {
        LearnerStore::get_by_id(store, learner.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_first_tick_only_arms() {
        let notifier = Arc::new(MockNotifier::default());
        let (store, scheduler, learner) = setup(notifier.clone(), 5).await;
        store.add(NewCard::new(learner.id, "cat", "кот", t0())).await.unwrap();

        let outcome = scheduler.tick(&learner, t0()).await.unwrap();
        assert_eq!(outcome, ReminderOutcome::Armed { next: t0() + Duration::minutes(5) });
        assert!(notifier.sent().is_empty());
        assert_eq!(
            reload(&store, &learner).await.next_reminder_at,
            Some(t0() + Duration::minutes(5))
        );
    }

    #[tokio::test]
    async fn test_not_due_is_noop() {
        let notifier = Arc::new(MockNotifier::default());
        let (store, scheduler, learner) = setup(notifier.clone(), 5).await;
        scheduler.tick(&learner, t0()).await.unwrap();
        let armed = reload(&store, &learner).await;

        let outcome = scheduler.tick(&armed, t0() + Duration::minutes(4)).await.unwrap();
        assert_eq!(outcome, ReminderOutcome::NotDue { next: t0() + Duration::minutes(5) });
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_due_tick_sends_and_reschedules() {
        let notifier = Arc::new(MockNotifier::default());
        let (store, scheduler, learner) = setup(notifier.clone(), 5).await;
        let card = store.add(NewCard::new(learner.id, "cat", "кот", t0())).await.unwrap();

        scheduler.tick(&learner, t0()).await.unwrap();
        let armed = reload(&store, &learner).await;
        let fire_at = t0() + Duration::minutes(5);

        let outcome = scheduler.tick(&armed, fire_at).await.unwrap();
        let next = fire_at + Duration::minutes(5);
        assert_eq!(outcome, ReminderOutcome::Sent { card_id: card.id, next });

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 500);
        assert_eq!(sent[0].1, "cat — кот");
        assert_eq!(sent[0].2, Some(Markup::spoilers(["кот"])));
        assert_eq!(reload(&store, &learner).await.next_reminder_at, Some(next));
    }

    #[tokio::test]
    async fn test_visible_translation_has_no_markup() {
        let notifier = Arc::new(MockNotifier::default());
        let (store, scheduler, mut learner) = setup(notifier.clone(), 1).await;
        store.add(NewCard::new(learner.id, "cat", "кот", t0())).await.unwrap();
        learner.hide_translations = false;
        learner.next_reminder_at = Some(t0());

        scheduler.tick(&learner, t0()).await.unwrap();
        assert_eq!(notifier.sent()[0].2, None);
    }

    #[tokio::test]
    async fn test_due_without_cards_still_reschedules() {
        let notifier = Arc::new(MockNotifier::default());
        let (store, scheduler, mut learner) = setup(notifier.clone(), 1).await;
        learner.next_reminder_at = Some(t0() - Duration::hours(3));

        let outcome = scheduler.tick(&learner, t0()).await.unwrap();
        let next = t0() + Duration::minutes(1);
        assert_eq!(outcome, ReminderOutcome::NothingToSend { next });
        assert!(notifier.sent().is_empty());
        assert_eq!(reload(&store, &learner).await.next_reminder_at, Some(next));
    }

    #[tokio::test]
    async fn test_learned_cards_are_not_reminded() {
        let notifier = Arc::new(MockNotifier::default());
        let (store, scheduler, mut learner) = setup(notifier.clone(), 1).await;
        let mut card = store.add(NewCard::new(learner.id, "cat", "кот", t0())).await.unwrap();
        card.learned = true;
        card.next_review_at = None;
        CardStore::update(store.as_ref(), &card).await.unwrap();
        learner.next_reminder_at = Some(t0());

        let outcome = scheduler.tick(&learner, t0()).await.unwrap();
        assert!(matches!(outcome, ReminderOutcome::NothingToSend { .. }));
    }

    #[tokio::test]
    async fn test_interval_floor_is_one_minute() {
        let notifier = Arc::new(MockNotifier::default());
        let (_store, scheduler, mut learner) = setup(notifier, 5).await;
        learner.reminder_interval_minutes = 0;

        let outcome = scheduler.tick(&learner, t0()).await.unwrap();
        assert_eq!(outcome, ReminderOutcome::Armed { next: t0() + Duration::minutes(1) });
    }

    #[tokio::test]
    async fn test_failed_send_keeps_schedule() {
        let notifier = Arc::new(MockNotifier::failing());
        let (store, scheduler, mut learner) = setup(notifier, 1).await;
        store.add(NewCard::new(learner.id, "cat", "кот", t0())).await.unwrap();
        store.set_next_reminder_at(learner.id, Some(t0())).await.unwrap();
        learner.next_reminder_at = Some(t0());

        let err = scheduler.tick(&learner, t0()).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(reload(&store, &learner).await.next_reminder_at, Some(t0()));
    }
}
