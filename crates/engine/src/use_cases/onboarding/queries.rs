//! Read-side progress queries.

use std::sync::Arc;

use questline_domain::{OnboardingProgress, StepDefinition, UserId};

use crate::infrastructure::ports::ProgressRepo;
use crate::use_cases::templates::TemplateStore;

use super::error::OnboardingError;

/// Pure reads over progress records; never mutates.
pub struct ProgressQueries {
    progress_repo: Arc<dyn ProgressRepo>,
    templates: Arc<TemplateStore>,
}

impl ProgressQueries {
    pub fn new(progress_repo: Arc<dyn ProgressRepo>, templates: Arc<TemplateStore>) -> Self {
        Self {
            progress_repo,
            templates,
        }
    }

    pub async fn get(
        &self,
        user_id: &UserId,
    ) -> Result<Option<OnboardingProgress>, OnboardingError> {
        Ok(self
            .progress_repo
            .get(user_id)
            .await?
            .map(|stored| stored.progress))
    }

    /// The lowest-order step still pending, resolved to its definition.
    /// `Ok(None)` means every step is terminal.
    pub async fn next_step(
        &self,
        user_id: &UserId,
    ) -> Result<Option<StepDefinition>, OnboardingError> {
        let progress = self
            .get(user_id)
            .await?
            .ok_or_else(|| OnboardingError::ProgressNotFound(user_id.clone()))?;
        let template = self
            .templates
            .get_for_progress(progress.template_id())
            .await?;
        Ok(progress.next_step(&template).cloned())
    }
}
