//! Once-a-day activity digest.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::error::LexicardResult;
use crate::notify::render_daily_summary;
use crate::services::StatsService;
use crate::traits::{LearnerStore, Notifier};
use crate::types::Learner;

/// What a summary tick did for one learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    OutsideWindow,
    AlreadySent,
    Sent,
}

/// Whether `now` falls within `tolerance` of `configured` on the UTC clock.
///
/// Compares times of day literally: a window around midnight does not wrap
/// into the neighbouring day.
pub fn within_window(now: DateTime<Utc>, configured: NaiveTime, tolerance: Duration) -> bool {
    let diff = now.time() - configured;
    diff <= tolerance && diff >= -tolerance
}

/// Sends each learner a digest once per UTC day around a configured time.
pub struct DailySummaryTrigger {
    learners: Arc<dyn LearnerStore>,
    stats: StatsService,
    notifier: Arc<dyn Notifier>,
    time_of_day: NaiveTime,
    tolerance: Duration,
}

impl DailySummaryTrigger {
    pub fn new(
        learners: Arc<dyn LearnerStore>,
        stats: StatsService,
        notifier: Arc<dyn Notifier>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            learners,
            stats,
            notifier,
            time_of_day: config.daily_summary_time,
            tolerance: config.summary_tolerance(),
        }
    }

    pub fn should_fire_now(&self, now: DateTime<Utc>) -> bool {
        within_window(now, self.time_of_day, self.tolerance)
    }

    /// Send today's digest to `learner` if inside the window and not sent yet.
    ///
    /// The sent marker is written after delivery; a failed send is retried on
    /// a later tick inside the same window.
    pub async fn tick(&self, learner: &Learner, now: DateTime<Utc>) -> LexicardResult<SummaryOutcome> {
        if !self.should_fire_now(now) {
            return Ok(SummaryOutcome::OutsideWindow);
        }

        let today = now.date_naive();
        if learner.summary_sent_on(today) {
            return Ok(SummaryOutcome::AlreadySent);
        }

        let stats = self.stats.today(learner.id, now).await?;
        let message = render_daily_summary(&stats);
        self.notifier
            .send(learner.chat_id, &message.text, message.markup.as_ref())
            .await?;
        self.learners.set_last_summary_on(learner.id, today).await?;

        debug!(learner_id = learner.id, %today, "Daily summary sent");
        Ok(SummaryOutcome::Sent)
    }
}
