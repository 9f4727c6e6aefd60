//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate ports around the domain aggregates.

pub mod badges;
pub mod onboarding;
pub mod templates;

pub use badges::{BadgeError, BadgeService};
pub use onboarding::{
    CompleteStep, OnboardingError, ProgressQueries, SkipStep, StartOnboarding, TransitionEffects,
};
pub use templates::TemplateStore;
