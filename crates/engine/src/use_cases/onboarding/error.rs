//! Onboarding operation errors.

use questline_domain::{StepId, TemplateId, TransitionBlocked, UserId};

use crate::infrastructure::ports::RepoError;

/// Errors that can occur during onboarding operations.
///
/// Validation errors are returned synchronously and never retried; only
/// `PersistenceUnavailable` indicates a fault worth retrying from outside.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),
    #[error("No default template is configured")]
    NoDefaultTemplate,
    #[error("No progress found for user {0}")]
    ProgressNotFound(UserId),
    #[error("Step not found: {0}")]
    StepNotFound(StepId),
    #[error("Cannot skip required step {0}")]
    CannotSkipRequiredStep(StepId),
    #[error("Progress is already completed; no further transitions")]
    AlreadyTerminal,
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

impl From<RepoError> for OnboardingError {
    fn from(err: RepoError) -> Self {
        Self::PersistenceUnavailable(err.to_string())
    }
}

impl From<TransitionBlocked> for OnboardingError {
    fn from(blocked: TransitionBlocked) -> Self {
        match blocked {
            TransitionBlocked::ProgressTerminal => Self::AlreadyTerminal,
            TransitionBlocked::StepNotInTemplate { step_id } => Self::StepNotFound(step_id),
            TransitionBlocked::RequiredStepSkip { step_id } => {
                Self::CannotSkipRequiredStep(step_id)
            }
        }
    }
}
