extern crate self as questline_domain;

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

// Re-export aggregates
pub use aggregates::OnboardingProgress;

// Re-export entities
pub use entities::{BadgeUnlock, GrantOutcome, QuestTemplate, StepDefinition, UserBadges};

pub use error::DomainError;
pub use events::{
    OnboardingEvent, StepTransition, TransitionBlocked, TransitionOutcome,
};

// Re-export ID types
pub use ids::{BadgeId, StepId, TemplateId, UserId};

// Re-export value objects
pub use value_objects::{Badge, BadgeCatalog, BadgeRarity, StepCategory, StepState, StepStatus};
