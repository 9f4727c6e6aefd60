//! Start onboarding use case.
//!
//! Initializes a user's progress from a quest template. Idempotent:
//! existing progress is returned unchanged, never reset.

use std::sync::Arc;

use questline_domain::{OnboardingEvent, OnboardingProgress, TemplateId, UserId};

use crate::infrastructure::ports::{ClockPort, ProgressRepo, RepoError};
use crate::use_cases::templates::TemplateStore;

use super::effects::TransitionEffects;
use super::error::OnboardingError;

/// Start onboarding use case.
///
/// Orchestrates: template resolution, progress creation, start event.
pub struct StartOnboarding {
    templates: Arc<TemplateStore>,
    progress_repo: Arc<dyn ProgressRepo>,
    clock: Arc<dyn ClockPort>,
    effects: TransitionEffects,
}

impl StartOnboarding {
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

    /// Execute the start onboarding use case.
    ///
    /// # Arguments
    /// * `user_id` - The user starting onboarding
    /// * `template_id` - Explicit template, or `None` for the default
    ///
    /// # Returns
    /// * `Ok(OnboardingProgress)` - Fresh progress, or the existing record
    /// * `Err(OnboardingError)` - Template missing or persistence down
    pub async fn execute(
        &self,
        user_id: UserId,
        template_id: Option<TemplateId>,
    ) -> Result<OnboardingProgress, OnboardingError> {
        if let Some(existing) = self.progress_repo.get(&user_id).await? {
            tracing::debug!(user_id = %user_id, "Onboarding already started; returning existing progress");
            return Ok(existing.progress);
        }

        let template = self.templates.get_active(template_id.as_ref()).await?;
        let progress = OnboardingProgress::start(user_id.clone(), &template, self.clock.now());

        match self.progress_repo.create(&progress).await {
            Ok(_) => {}
            Err(RepoError::Conflict) => {
                // Lost a concurrent initialization race: the first writer's
                // record stands.
                let existing = self.progress_repo.get(&user_id).await?.ok_or_else(|| {
                    OnboardingError::PersistenceUnavailable(
                        "progress vanished during concurrent initialization".to_string(),
                    )
                })?;
                return Ok(existing.progress);
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            user_id = %user_id,
            template_id = %template.id(),
            steps = template.step_count(),
            "Onboarding started"
        );
        self.effects
            .emit(OnboardingEvent::OnboardingStarted {
                user_id,
                template_id: template.id().clone(),
            })
            .await;
        self.effects.publish(&progress);

        Ok(progress)
    }
}
