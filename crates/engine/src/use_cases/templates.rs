//! Template store - read-side access to the quest template catalog.
//!
//! Templates are authored externally; this wrapper only resolves reads,
//! applying the active/default rules the progress operations rely on.

use std::sync::Arc;

use questline_domain::{QuestTemplate, TemplateId};

use crate::infrastructure::ports::TemplateRepo;
use crate::use_cases::onboarding::OnboardingError;

pub struct TemplateStore {
    repo: Arc<dyn TemplateRepo>,
}

impl TemplateStore {
    pub fn new(repo: Arc<dyn TemplateRepo>) -> Self {
        Self { repo }
    }

    /// Resolve the template for a fresh initialization: the named template
    /// when an id is given (it must be active), otherwise the designated
    /// default.
    pub async fn get_active(
        &self,
        id: Option<&TemplateId>,
    ) -> Result<QuestTemplate, OnboardingError> {
        match id {
            Some(id) => self
                .repo
                .get(id)
                .await?
                .filter(|template| template.is_active())
                .ok_or_else(|| OnboardingError::TemplateNotFound(id.clone())),
            None => self
                .repo
                .get_default()
                .await?
                .ok_or(OnboardingError::NoDefaultTemplate),
        }
    }

    /// Resolve the template backing an existing progress record. Inactive
    /// templates still resolve here: deactivation only stops new
    /// initializations, never in-flight progress.
    pub async fn get_for_progress(
        &self,
        id: &TemplateId,
    ) -> Result<QuestTemplate, OnboardingError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| OnboardingError::TemplateNotFound(id.clone()))
    }

    /// Active templates, newest first.
    pub async fn list_active(&self) -> Result<Vec<QuestTemplate>, OnboardingError> {
        Ok(self.repo.list_active().await?)
    }
}
