//! Skip step use case.
//!
//! Marks an optional step skipped: no points, no badge, but the step
//! becomes terminal and can finish the quest. Required steps refuse to be
//! skipped.

use std::sync::Arc;

use questline_domain::{
    OnboardingEvent, OnboardingProgress, StepId, TransitionOutcome, UserId,
};

use crate::infrastructure::ports::{ClockPort, ProgressRepo, RepoError};
use crate::use_cases::templates::TemplateStore;

use super::complete_step::MAX_TRANSITION_RETRIES;
use super::effects::TransitionEffects;
use super::error::OnboardingError;

/// Skip step use case.
///
/// Orchestrates: progress load, skip transition, conditional write,
/// lifecycle events.
pub struct SkipStep {
    templates: Arc<TemplateStore>,
    progress_repo: Arc<dyn ProgressRepo>,
    clock: Arc<dyn ClockPort>,
    effects: TransitionEffects,
}

impl SkipStep {
    pub fn new(
        templates: Arc<TemplateStore>,
        progress_repo: Arc<dyn ProgressRepo>,
        clock: Arc<dyn ClockPort>,
        effects: TransitionEffects,
    ) -> Self {
        Self {
            templates,
            progress_repo,
            clock,
            effects,
        }
    }

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

            let transition = match progress.skip_step(&template, &step_id, now)? {
                TransitionOutcome::AlreadyDone => {
                    tracing::debug!(user_id = %user_id, step_id = %step_id, "Step already terminal");
                    return Ok(progress);
                }
                TransitionOutcome::Applied(transition) => transition,
            };

            match self.progress_repo.update(&progress, stored.version).await {
                Ok(_) => {
                    tracing::info!(
                        user_id = %user_id,
                        step_id = %step_id,
                        completion = progress.completion_percentage(),
                        "Step skipped"
                    );
                    self.effects
                        .emit(OnboardingEvent::StepSkipped {
                            user_id: user_id.clone(),
                            step_id: step_id.clone(),
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
                        "Progress version conflict; retrying skip"
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
