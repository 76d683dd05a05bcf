//! Periodic reminder loop.
//!
//! Every tick lists all learners and, for each one, runs the reminder step
//! followed by the daily summary step. A failure for one learner is logged
//! and counted; the remaining learners and later ticks are unaffected.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::error::LexicardResult;
use crate::traits::{Clock, LearnerStore};
use crate::types::Learner;

use super::reminder::{ReminderOutcome, ReminderScheduler};
use super::summary::{DailySummaryTrigger, SummaryOutcome};

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Learners processed (successfully or not).
    pub learners: usize,
    pub reminders_sent: usize,
    pub summaries_sent: usize,
    pub failures: usize,
    /// Learners left for the next tick because shutdown was requested.
    pub skipped: usize,
}

/// Drives [`ReminderScheduler`] and [`DailySummaryTrigger`] on a fixed period.
pub struct SchedulerLoop {
    learners: Arc<dyn LearnerStore>,
    reminders: ReminderScheduler,
    summaries: DailySummaryTrigger,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl SchedulerLoop {
    pub fn new(
        learners: Arc<dyn LearnerStore>,
        reminders: ReminderScheduler,
        summaries: DailySummaryTrigger,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            learners,
            reminders,
            summaries,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run one tick over every learner.
    ///
    /// Only listing the learners can fail; per-learner errors are logged and
    /// counted in the report.
    pub async fn tick(&self) -> LexicardResult<TickReport> {
        self.tick_until(&CancellationToken::new()).await
    }

    async fn tick_until(&self, shutdown: &CancellationToken) -> LexicardResult<TickReport> {
        let learners = self.learners.list_all().await?;
        let total = learners.len();
        let concurrency = self.config.learner_concurrency.max(1);

        // Cancellation stops handing out learners; ones already started finish.
        let results: Vec<_> = stream::iter(learners)
            .take_until(shutdown.cancelled())
            .map(|learner| async move {
                let result = self.process_learner(&learner).await;
                (learner, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = TickReport {
            learners: results.len(),
            skipped: total - results.len(),
            ..Default::default()
        };

        for (learner, result) in results {
            match result {
                Ok((reminder, summary)) => {
                    if reminder.sent() {
                        report.reminders_sent += 1;
                    }
                    if summary == SummaryOutcome::Sent {
                        report.summaries_sent += 1;
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    error!(
                        learner_id = learner.id,
                        code = e.code().as_str(),
                        transient = e.is_transient(),
                        error = %e,
                        "Failed to process learner"
                    );
                }
            }
        }

        Ok(report)
    }

    async fn process_learner(&self, learner: &Learner) -> LexicardResult<(ReminderOutcome, SummaryOutcome)> {
        let now = self.clock.now();
        let reminder = self.reminders.tick(learner, now).await?;
        let summary = self.summaries.tick(learner, now).await?;
        Ok((reminder, summary))
    }

    /// Tick until `shutdown` is cancelled.
    ///
    /// Waits `warmup` before the first tick. Both the warm-up and the
    /// inter-tick delay return as soon as shutdown is requested.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            tick_secs = self.config.tick_interval_secs,
            warmup_secs = self.config.warmup_secs,
            concurrency = self.config.learner_concurrency,
            "Scheduler loop starting"
        );

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Scheduler loop cancelled during warm-up");
                return;
            }
            _ = tokio::time::sleep(self.config.warmup()) => {}
        }

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            match self.tick_until(&shutdown).await {
                Ok(report) => debug!(
                    learners = report.learners,
                    reminders = report.reminders_sent,
                    summaries = report.summaries_sent,
                    failures = report.failures,
                    skipped = report.skipped,
                    "Tick complete"
                ),
                Err(e) => error!(error = %e, "Tick failed to list learners"),
            }
        }

        info!("Scheduler loop stopped");
    }
}
