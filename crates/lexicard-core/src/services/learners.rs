use std::sync::Arc;

use tracing::info;

use crate::error::{LexicardError, LexicardResult};
use crate::traits::{Clock, LearnerStore};
use crate::types::{ChatId, Learner, LearnerId, ReminderSettings};

/// Learner registration and reminder settings.
pub struct LearnerService {
    learners: Arc<dyn LearnerStore>,
    clock: Arc<dyn Clock>,
}

impl LearnerService {
    pub fn new(learners: Arc<dyn LearnerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { learners, clock }
    }

    /// Look up or register the learner behind `chat_id`, refreshing the stored
    /// username when a different non-blank one is supplied.
    pub async fn get_or_create_and_sync_username(
        &self,
        chat_id: ChatId,
        username: Option<&str>,
    ) -> LexicardResult<Learner> {
        let username = username.map(str::trim).filter(|u| !u.is_empty());
        let mut learner = self
            .learners
            .get_or_create(chat_id, username, self.clock.now())
            .await?;

        if let Some(username) = username {
            if learner.username.as_deref() != Some(username) {
                learner.username = Some(username.to_string());
                self.learners.update(&learner).await?;
            }
        }
        Ok(learner)
    }

    /// Apply a settings change.
    ///
    /// The pending reminder is left alone; a new interval takes effect when the
    /// reminder scheduler next reschedules.
    pub async fn update_settings(
        &self,
        learner_id: LearnerId,
        settings: ReminderSettings,
    ) -> LexicardResult<Learner> {
        let mut learner = self
            .learners
            .get_by_id(learner_id)
            .await?
            .ok_or_else(|| LexicardError::learner_not_found(learner_id))?;

        if let Some(minutes) = settings.interval_minutes {
            if minutes < 1 {
                return Err(LexicardError::out_of_range(
                    format!("reminder interval must be at least 1 minute, got {}", minutes),
                    "Use an interval of 1 minute or more",
                ));
            }
            learner.reminder_interval_minutes = minutes;
        }
        if let Some(hide) = settings.hide_translations {
            learner.hide_translations = hide;
        }

        self.learners.update(&learner).await?;

        info!(
            learner_id,
            interval_minutes = learner.reminder_interval_minutes,
            hide_translations = learner.hide_translations,
            "Reminder settings updated"
        );
        Ok(learner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::traits::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn service() -> (Arc<SqliteStore>, LearnerService) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(t0()));
        (store.clone(), LearnerService::new(store, clock))
    }

    #[tokio::test]
    async fn test_username_sync() {
        let (_, service) = service();
        let first = service.get_or_create_and_sync_username(10, Some("old")).await.unwrap();
        assert_eq!(first.username.as_deref(), Some("old"));

        let renamed = service.get_or_create_and_sync_username(10, Some("new")).await.unwrap();
        assert_eq!(renamed.id, first.id);
        assert_eq!(renamed.username.as_deref(), Some("new"));

        let blank = service.get_or_create_and_sync_username(10, Some("  ")).await.unwrap();
        assert_eq!(blank.username.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_new_learner_created_at_uses_clock() {
        let (_, service) = service();
        let learner = service.get_or_create_and_sync_username(14, None).await.unwrap();
        assert_eq!(learner.created_at, t0());
    }

    #[tokio::test]
    async fn test_interval_change_keeps_pending_reminder() {
        let (store, service) = service();
        let learner = service.get_or_create_and_sync_username(11, None).await.unwrap();
        store.set_next_reminder_at(learner.id, Some(t0())).await.unwrap();

        let updated = service
            .update_settings(learner.id, ReminderSettings::interval(5))
            .await
            .unwrap();
        assert_eq!(updated.reminder_interval_minutes, 5);
        assert_eq!(updated.next_reminder_at, Some(t0()));

        let stored = LearnerStore::get_by_id(store.as_ref(), learner.id).await.unwrap().unwrap();
        assert_eq!(stored.reminder_interval_minutes, 5);
        assert_eq!(stored.next_reminder_at, Some(t0()));
    }

    #[tokio::test]
    async fn test_visibility_change_keeps_schedule() {
        let (store, service) = service();
        let learner = service.get_or_create_and_sync_username(12, None).await.unwrap();
        let at = t0();
        store.set_next_reminder_at(learner.id, Some(at)).await.unwrap();

        let updated = service
            .update_settings(learner.id, ReminderSettings::hide_translations(false))
            .await
            .unwrap();
        assert!(!updated.hide_translations);
        assert_eq!(updated.next_reminder_at, Some(at));
    }

    #[tokio::test]
    async fn test_rejects_interval_below_one_minute() {
        let (_, service) = service();
        let learner = service.get_or_create_and_sync_username(13, None).await.unwrap();
        let err = service
            .update_settings(learner.id, ReminderSettings::interval(0))
            .await
            .unwrap_err();
        assert!(matches!(err, LexicardError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_learner() {
        let (_, service) = service();
        let err = service
            .update_settings(99, ReminderSettings::interval(5))
            .await
            .unwrap_err();
        assert!(matches!(err, LexicardError::NotFound { .. }));
    }
}
