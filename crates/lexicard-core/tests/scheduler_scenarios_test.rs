//! End-to-end scenarios for review scheduling and the reminder loop.
//!
//! Everything runs against an in-memory SQLite store with a manual clock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use lexicard_core::{
    CardService, CardStore, ChatId, DailySummaryTrigger, LearnerService, LearnerStore,
    LexicardResult, ManualClock, Markup, Notifier, ReminderScheduler, ReminderSettings,
    ReviewOutcome, SchedulerConfig, SchedulerLoop, SqliteStore, StatsService,
};
use std::sync::{Arc, Mutex};

/// Records every message it is asked to deliver.
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(ChatId, String, Option<Markup>)>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<(ChatId, String, Option<Markup>)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: ChatId, text: &str, markup: Option<&Markup>) -> LexicardResult<()> {
        self.messages
            .lock()
            .unwrap()
            .push((chat_id, text.to_string(), markup.cloned()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct Harness {
    store: Arc<SqliteStore>,
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
    cards: CardService,
    learners: LearnerService,
    scheduler: SchedulerLoop,
}

fn harness(start: DateTime<Utc>, config: SchedulerConfig) -> Harness {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(start));
    let notifier = Arc::new(RecordingNotifier::default());

    let reminders = ReminderScheduler::new(store.clone(), store.clone(), notifier.clone()).with_rng_seed(42);
    let summaries = DailySummaryTrigger::new(
        store.clone(),
        StatsService::new(store.clone(), store.clone()),
        notifier.clone(),
        &config,
    );
    let scheduler = SchedulerLoop::new(store.clone(), reminders, summaries, clock.clone(), config);

    Harness {
        cards: CardService::new(store.clone(), store.clone(), clock.clone()).with_rng_seed(42),
        learners: LearnerService::new(store.clone(), clock.clone()),
        store,
        clock,
        notifier,
        scheduler,
    }
}

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 4, 9, 0, 0).unwrap()
}

/// One-minute cadence: arm at t0, fire at t0+61s, reschedule to t0+1m61s.
#[tokio::test]
async fn test_one_minute_reminder_scenario() {
    let h = harness(morning(), SchedulerConfig::default());
    let learner = h.learners.get_or_create_and_sync_username(77, Some("kate")).await.unwrap();
    h.learners
        .update_settings(learner.id, ReminderSettings::interval(1))
        .await
        .unwrap();
    h.cards.add_card(learner.id, "cat", "кот", None, None).await.unwrap();

    let t0 = morning();
    let report = h.scheduler.tick().await.unwrap();
    assert_eq!(report.reminders_sent, 0);
    let armed = LearnerStore::get_by_id(h.store.as_ref(), learner.id).await.unwrap().unwrap();
    assert_eq!(armed.next_reminder_at, Some(t0 + Duration::minutes(1)));

    h.clock.set(t0 + Duration::seconds(61));
    let report = h.scheduler.tick().await.unwrap();
    assert_eq!(report.reminders_sent, 1);

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, 77);
    assert!(messages[0].1.contains("cat"));
    assert_eq!(messages[0].2, Some(Markup::spoilers(["кот"])));

    let rescheduled = LearnerStore::get_by_id(h.store.as_ref(), learner.id).await.unwrap().unwrap();
    assert_eq!(
        rescheduled.next_reminder_at,
        Some(t0 + Duration::minutes(1) + Duration::seconds(61))
    );
}

/// A due reminder still fires after the interval changes; the new cadence
/// applies from the following reschedule.
#[tokio::test]
async fn test_interval_change_does_not_postpone_due_reminder() {
    let h = harness(morning(), SchedulerConfig::default());
    let learner = h.learners.get_or_create_and_sync_username(60, None).await.unwrap();
    h.cards.add_card(learner.id, "fox", "лиса", None, None).await.unwrap();

    let t0 = morning();
    h.scheduler.tick().await.unwrap();
    h.clock.set(t0 + Duration::minutes(60));

    h.learners
        .update_settings(learner.id, ReminderSettings::interval(5))
        .await
        .unwrap();
    let pending = LearnerStore::get_by_id(h.store.as_ref(), learner.id).await.unwrap().unwrap();
    assert_eq!(pending.next_reminder_at, Some(t0 + Duration::minutes(60)));

    let fired_at = t0 + Duration::minutes(60) + Duration::seconds(30);
    h.clock.set(fired_at);
    let report = h.scheduler.tick().await.unwrap();
    assert_eq!(report.reminders_sent, 1);

    let rescheduled = LearnerStore::get_by_id(h.store.as_ref(), learner.id).await.unwrap().unwrap();
    assert_eq!(rescheduled.next_reminder_at, Some(fired_at + Duration::minutes(5)));
}

/// Five-minute cadence: at most one reminder per interval.
#[tokio::test]
async fn test_five_minute_cadence_sends_at_most_once_per_interval() {
    let h = harness(morning(), SchedulerConfig::default());
    let learner = h.learners.get_or_create_and_sync_username(5, None).await.unwrap();
    h.learners
        .update_settings(learner.id, ReminderSettings::interval(5))
        .await
        .unwrap();
    h.cards.add_card(learner.id, "dog", "собака", None, None).await.unwrap();

    // Minute-by-minute ticks across fifteen minutes.
    for _ in 0..=15 {
        h.scheduler.tick().await.unwrap();
        h.clock.advance(Duration::minutes(1));
    }

    // Armed at 0, fired at 5, 10 and 15.
    assert_eq!(h.notifier.messages().len(), 3);
}

/// Level 9 → 10 schedules the 19-day gap; the next correct answer learns the card.
#[tokio::test]
async fn test_level_nine_to_learned() {
    let h = harness(morning(), SchedulerConfig::default());
    let learner = h.learners.get_or_create_and_sync_username(9, None).await.unwrap();
    let mut card = h.cards.add_card(learner.id, "owl", "сова", None, None).await.unwrap();
    card.level = 9;
    CardStore::update(h.store.as_ref(), &card).await.unwrap();

    let ReviewOutcome::Applied(first) = h.cards.record_review(card.id, true).await.unwrap() else {
        panic!("card should exist");
    };
    assert_eq!(first.card.level, 10);
    assert_eq!(first.card.next_review_at, Some(morning() + Duration::days(19)));
    assert!(!first.card.learned);

    h.clock.advance(Duration::days(19));
    let ReviewOutcome::Applied(second) = h.cards.record_review(card.id, true).await.unwrap() else {
        panic!("card should exist");
    };
    assert_eq!(second.card.level, 11);
    assert!(second.card.learned);
    assert!(second.card.next_review_at.is_none());
    assert!(second.just_learned);

    // Learned cards are neither due nor reminded.
    assert!(h.cards.next_due_card(learner.id).await.unwrap().is_none());
}

/// No due cards is an empty result, not an error.
#[tokio::test]
async fn test_practice_with_nothing_due() {
    let h = harness(morning(), SchedulerConfig::default());
    let learner = h.learners.get_or_create_and_sync_username(1, None).await.unwrap();
    assert!(h.cards.next_due_card(learner.id).await.unwrap().is_none());

    h.cards.add_card(learner.id, "sun", "солнце", None, None).await.unwrap();
    assert!(h.cards.next_due_card(learner.id).await.unwrap().is_none());

    h.clock.advance(Duration::days(1));
    assert!(h.cards.next_due_card(learner.id).await.unwrap().is_some());
}

/// The digest goes out once per day even with several ticks inside the window.
#[tokio::test]
async fn test_daily_summary_once_per_day() {
    let config = SchedulerConfig {
        daily_summary_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        ..Default::default()
    };
    let evening = Utc.with_ymd_and_hms(2024, 11, 4, 20, 59, 0).unwrap();
    let h = harness(evening, config);
    let learner = h.learners.get_or_create_and_sync_username(21, None).await.unwrap();
    let card = h.cards.add_card(learner.id, "moon", "луна", None, None).await.unwrap();
    h.cards.record_review(card.id, true).await.unwrap();

    let mut summaries = 0;
    for _ in 0..5 {
        summaries += h.scheduler.tick().await.unwrap().summaries_sent;
        h.clock.advance(Duration::seconds(30));
    }
    assert_eq!(summaries, 1);

    let digest = h
        .notifier
        .messages()
        .into_iter()
        .find(|(_, text, _)| text.starts_with("Daily summary"))
        .unwrap();
    assert!(digest.1.contains("New words today: 1"));
    assert!(digest.1.contains("Reviews today: 1 (correct: 1)"));
}
