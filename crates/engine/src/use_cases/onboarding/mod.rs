//! Onboarding progress operations.
//!
//! One use case per transition, plus read-side queries. All of them go
//! through the `OnboardingProgress` aggregate; the use cases only
//! orchestrate ports around it.

mod complete_step;
mod effects;
mod error;
mod queries;
mod skip_step;
mod start;

pub use complete_step::CompleteStep;
pub use effects::TransitionEffects;
pub use error::OnboardingError;
pub use queries::ProgressQueries;
pub use skip_step::SkipStep;
pub use start::StartOnboarding;
