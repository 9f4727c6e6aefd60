//! Complete step use case.
//!
//! Applies the pending->completed transition, awards points, unlocks any
//! attached badge (best-effort), and emits the lifecycle events. The whole
//! read-validate-apply cycle retries on version conflicts so concurrent
//! completions of different steps are both durably recorded.

use std::sync::Arc;

use questline_domain::{
    OnboardingEvent, OnboardingProgress, StepId, TransitionOutcome, UserId,
};

use crate::infrastructure::ports::{ClockPort, ProgressRepo, RepoError};
use crate::use_cases::badges::BadgeService;
use crate::use_cases::templates::TemplateStore;

use super::effects::TransitionEffects;
use super::error::OnboardingError;

/// Bounded retry for the optimistic-concurrency loop. Conflicts need two
/// writers on one user's record, so contention drains quickly.
pub(crate) const MAX_TRANSITION_RETRIES: usize = 3;

/// Complete step use case.
///
/// Orchestrates: progress load, transition, badge unlock, conditional
/// write, lifecycle events.
pub struct CompleteStep {
    templates: Arc<TemplateStore>,
    progress_repo: Arc<dyn ProgressRepo>,
    badges: Arc<BadgeService>,
    clock: Arc<dyn ClockPort>,
    effects: TransitionEffects,
}

impl CompleteStep {
    pub fn new(
        templates: Arc<TemplateStore>,
        progress_repo: Arc<dyn ProgressRepo>,
        badges: Arc<BadgeService>,
        clock: Arc<dyn ClockPort>,
        effects: TransitionEffects,
    ) -> Self {
        Self {
            templates,
            progress_repo,
            badges,
            clock,
            effects,
        }
    }

    /// Execute the complete step use case.
    ///
    /// # Returns
    /// * `Ok(OnboardingProgress)` - Updated progress (unchanged if the step
    ///   was already completed)
    /// * `Err(OnboardingError)` - Validation refused or persistence down
    pub async fn execute(
        &self,
        user_id: UserId,
        step_id: StepId,
    ) -> Result<OnboardingProgress, OnboardingError> {
        for attempt in 0..MAX_TRANSITION_RETRIES {
            let stored = self
                .progress_repo
                .get(&user_id)
                .await?
                .ok_or_else(|| OnboardingError::ProgressNotFound(user_id.clone()))?;
            let mut progress = stored.progress;
            let template = self
                .templates
                .get_for_progress(progress.template_id())
                .await?;
            let now = self.clock.now();

            let transition = match progress.complete_step(&template, &step_id, now)? {
                TransitionOutcome::AlreadyDone => {
                    tracing::debug!(user_id = %user_id, step_id = %step_id, "Step already completed");
                    return Ok(progress);
                }
                TransitionOutcome::Applied(transition) => transition,
            };

            // Unlock before the write so the earned badge lands in the same
            // document version. Failure never rolls back the completion.
            if let Some(badge_id) = &transition.badge_id {
                match self.badges.unlock(&user_id, badge_id).await {
                    Ok(_) => {
                        progress.record_badge(badge_id.clone());
                    }
                    Err(e) => {
                        tracing::warn!(
                            user_id = %user_id,
                            step_id = %step_id,
                            badge_id = %badge_id,
                            error = %e,
                            "Badge unlock failed; step completion continues"
                        );
                    }
                }
            }

            match self.progress_repo.update(&progress, stored.version).await {
                Ok(_) => {
                    tracing::info!(
                        user_id = %user_id,
                        step_id = %step_id,
                        points = transition.points_awarded,
                        completion = progress.completion_percentage(),
                        "Step completed"
                    );
                    self.effects
                        .emit(OnboardingEvent::StepCompleted {
                            user_id: user_id.clone(),
                            step_id: step_id.clone(),
                            points: transition.points_awarded,
                            badge_id: transition.badge_id.clone(),
                        })
                        .await;
                    if transition.quest_completed {
                        tracing::info!(
                            user_id = %user_id,
                            total_points = progress.total_points_earned(),
                            "Quest completed"
                        );
                        self.effects
                            .emit(OnboardingEvent::QuestCompleted {
                                user_id: user_id.clone(),
                                total_points: progress.total_points_earned(),
                                badge_count: progress.badges_earned().len() as u32,
                                duration_ms: progress.elapsed_ms(now),
                            })
                            .await;
                    }
                    self.effects.publish(&progress);
                    return Ok(progress);
                }
                Err(RepoError::Conflict) => {
                    tracing::debug!(
                        user_id = %user_id,
                        step_id = %step_id,
                        attempt,
                        "Progress version conflict; retrying transition"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(OnboardingError::PersistenceUnavailable(
            "progress update contention persisted across retries".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::{InMemoryBadgeRepo, RecordingAnalytics};
    use crate::infrastructure::notifier::ProgressNotifier;
    use crate::infrastructure::ports::{
        BadgeRepo, MockBadgeRepo, MockProgressRepo, MockTemplateRepo, VersionedProgress,
    };
    use chrono::Utc;
    use questline_domain::{
        Badge, BadgeCatalog, BadgeId, BadgeRarity, QuestTemplate, StepDefinition, TemplateId,
    };

    fn template() -> QuestTemplate {
        QuestTemplate::new(
            TemplateId::new("t").expect("valid id"),
            "T",
            vec![
                StepDefinition::new(StepId::new("one").expect("valid id"), "One", 1, 50, true),
                StepDefinition::new(StepId::new("two").expect("valid id"), "Two", 2, 75, true)
                    .with_badge(BadgeId::new("explorer").expect("valid id")),
            ],
            Utc::now(),
        )
        .expect("valid template")
    }

    fn catalog() -> Arc<BadgeCatalog> {
        Arc::new(
            BadgeCatalog::new(vec![Badge::new(
                BadgeId::new("explorer").expect("valid id"),
                "Explorer",
                "Took the tour",
                BadgeRarity::Common,
            )])
            .expect("valid catalog"),
        )
    }

    fn template_repo() -> MockTemplateRepo {
        let mut repo = MockTemplateRepo::new();
        repo.expect_get().returning(|_| Ok(Some(template())));
        repo
    }

    struct Harness {
        analytics: Arc<RecordingAnalytics>,
        use_case: CompleteStep,
    }

    fn harness(progress_repo: MockProgressRepo, badge_repo: Arc<dyn BadgeRepo>) -> Harness {
        let analytics = Arc::new(RecordingAnalytics::new());
        let clock: Arc<dyn ClockPort> = Arc::new(FixedClock(Utc::now()));
        let effects = TransitionEffects::new(analytics.clone(), Arc::new(ProgressNotifier::new()));
        let badges = Arc::new(BadgeService::new(catalog(), badge_repo, clock.clone()));
        let use_case = CompleteStep::new(
            Arc::new(TemplateStore::new(Arc::new(template_repo()))),
            Arc::new(progress_repo),
            badges,
            clock,
            effects,
        );
        Harness {
            analytics,
            use_case,
        }
    }

    fn user() -> UserId {
        UserId::new("u1").expect("valid id")
    }

    fn step(s: &str) -> StepId {
        StepId::new(s).expect("valid id")
    }

    fn stored_progress() -> VersionedProgress {
        VersionedProgress {
            progress: OnboardingProgress::start(user(), &template(), Utc::now()),
            version: 1,
        }
    }

    #[tokio::test]
    async fn missing_progress_is_refused() {
        let mut progress_repo = MockProgressRepo::new();
        progress_repo.expect_get().returning(|_| Ok(None));
        progress_repo.expect_update().times(0);

        let h = harness(progress_repo, Arc::new(InMemoryBadgeRepo::new()));
        let result = h.use_case.execute(user(), step("one")).await;
        assert!(matches!(result, Err(OnboardingError::ProgressNotFound(_))));
    }

    #[tokio::test]
    async fn unknown_step_is_refused_without_a_write() {
        let mut progress_repo = MockProgressRepo::new();
        progress_repo
            .expect_get()
            .returning(|_| Ok(Some(stored_progress())));
        progress_repo.expect_update().times(0);

        let h = harness(progress_repo, Arc::new(InMemoryBadgeRepo::new()));
        let result = h.use_case.execute(user(), step("nonexistent-step")).await;
        assert!(matches!(result, Err(OnboardingError::StepNotFound(_))));
        assert!(h.analytics.events().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_completion_is_a_no_op_without_a_write() {
        let mut already = stored_progress();
        already
            .progress
            .complete_step(&template(), &step("one"), Utc::now())
            .expect("transition allowed");
        let already_clone = already.progress.clone();

        let mut progress_repo = MockProgressRepo::new();
        progress_repo.expect_get().returning(move |_| {
            Ok(Some(VersionedProgress {
                progress: already_clone.clone(),
                version: 2,
            }))
        });
        progress_repo.expect_update().times(0);

        let h = harness(progress_repo, Arc::new(InMemoryBadgeRepo::new()));
        let progress = h
            .use_case
            .execute(user(), step("one"))
            .await
            .expect("idempotent repeat");
        assert_eq!(progress, already.progress);
        assert!(h.analytics.events().await.is_empty());
    }

    #[tokio::test]
    async fn terminal_progress_is_refused() {
        let mut done = stored_progress();
        for id in ["one", "two"] {
            done.progress
                .complete_step(&template(), &step(id), Utc::now())
                .expect("transition allowed");
        }
        let done_clone = done.progress.clone();

        let mut progress_repo = MockProgressRepo::new();
        progress_repo.expect_get().returning(move |_| {
            Ok(Some(VersionedProgress {
                progress: done_clone.clone(),
                version: 3,
            }))
        });
        progress_repo.expect_update().times(0);

        let h = harness(progress_repo, Arc::new(InMemoryBadgeRepo::new()));
        let result = h.use_case.execute(user(), step("one")).await;
        assert!(matches!(result, Err(OnboardingError::AlreadyTerminal)));
    }

    #[tokio::test]
    async fn completion_awards_points_and_emits_events() {
        let mut progress_repo = MockProgressRepo::new();
        progress_repo
            .expect_get()
            .returning(|_| Ok(Some(stored_progress())));
        progress_repo
            .expect_update()
            .withf(|progress, expected| {
                *expected == 1 && progress.total_points_earned() == 50
            })
            .returning(|progress, expected| {
                Ok(VersionedProgress {
                    progress: progress.clone(),
                    version: expected + 1,
                })
            });

        let h = harness(progress_repo, Arc::new(InMemoryBadgeRepo::new()));
        let progress = h
            .use_case
            .execute(user(), step("one"))
            .await
            .expect("completion works");

        assert_eq!(progress.total_points_earned(), 50);
        assert_eq!(progress.completion_percentage(), 50);

        let events = h.analytics.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "step_completed");
    }

    #[tokio::test]
    async fn finishing_the_last_step_emits_quest_completed_with_badge() {
        let mut partway = stored_progress();
        partway
            .progress
            .complete_step(&template(), &step("one"), Utc::now())
            .expect("transition allowed");
        let partway_clone = partway.progress.clone();

        let mut progress_repo = MockProgressRepo::new();
        progress_repo.expect_get().returning(move |_| {
            Ok(Some(VersionedProgress {
                progress: partway_clone.clone(),
                version: 2,
            }))
        });
        progress_repo.expect_update().returning(|progress, expected| {
            Ok(VersionedProgress {
                progress: progress.clone(),
                version: expected + 1,
            })
        });

        let badge_repo = Arc::new(InMemoryBadgeRepo::new());
        let h = harness(progress_repo, badge_repo.clone());
        let progress = h
            .use_case
            .execute(user(), step("two"))
            .await
            .expect("completion works");

        assert!(progress.is_completed());
        assert_eq!(progress.total_points_earned(), 125);
        assert_eq!(
            progress.badges_earned().iter().map(|b| b.as_str()).collect::<Vec<_>>(),
            vec!["explorer"]
        );

        let events = h.analytics.events().await;
        let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["step_completed", "quest_completed"]);

        let unlocked = badge_repo.get(&user()).await.expect("get works");
        assert!(unlocked.has(&BadgeId::new("explorer").expect("valid id")));
    }

    #[tokio::test]
    async fn badge_unlock_failure_does_not_fail_the_completion() {
        let mut partway = stored_progress();
        partway
            .progress
            .complete_step(&template(), &step("one"), Utc::now())
            .expect("transition allowed");
        let partway_clone = partway.progress.clone();

        let mut progress_repo = MockProgressRepo::new();
        progress_repo.expect_get().returning(move |_| {
            Ok(Some(VersionedProgress {
                progress: partway_clone.clone(),
                version: 2,
            }))
        });
        progress_repo.expect_update().returning(|progress, expected| {
            Ok(VersionedProgress {
                progress: progress.clone(),
                version: expected + 1,
            })
        });

        let mut badge_repo = MockBadgeRepo::new();
        badge_repo
            .expect_grant()
            .returning(|_, _, _| Err(RepoError::database("badges", "disk full")));

        let h = harness(progress_repo, Arc::new(badge_repo));
        let progress = h
            .use_case
            .execute(user(), step("two"))
            .await
            .expect("completion still works");

        assert!(progress.is_completed());
        // The badge never made it into the record
        assert!(progress.badges_earned().is_empty());
    }

    #[tokio::test]
    async fn version_conflict_retries_and_succeeds() {
        let mut progress_repo = MockProgressRepo::new();
        progress_repo
            .expect_get()
            .returning(|_| Ok(Some(stored_progress())));
        let mut first_attempt = true;
        progress_repo.expect_update().returning(move |progress, expected| {
            if first_attempt {
                first_attempt = false;
                Err(RepoError::Conflict)
            } else {
                Ok(VersionedProgress {
                    progress: progress.clone(),
                    version: expected + 1,
                })
            }
        });

        let h = harness(progress_repo, Arc::new(InMemoryBadgeRepo::new()));
        let progress = h
            .use_case
            .execute(user(), step("one"))
            .await
            .expect("retry succeeds");
        assert_eq!(progress.total_points_earned(), 50);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_persistence_unavailable() {
        let mut progress_repo = MockProgressRepo::new();
        progress_repo
            .expect_get()
            .returning(|_| Ok(Some(stored_progress())));
        progress_repo
            .expect_update()
            .times(MAX_TRANSITION_RETRIES)
            .returning(|_, _| Err(RepoError::Conflict));

        let h = harness(progress_repo, Arc::new(InMemoryBadgeRepo::new()));
        let result = h.use_case.execute(user(), step("one")).await;
        assert!(matches!(
            result,
            Err(OnboardingError::PersistenceUnavailable(_))
        ));
    }
}
