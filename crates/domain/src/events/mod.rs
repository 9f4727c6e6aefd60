//! Domain Events
//!
//! Lifecycle events emitted by the progress engine for analytics sinks and
//! any other decoupled consumer (reputation ledgers, reminder schedulers).
//! The `progress_events` submodule contains return types from aggregate
//! mutations, communicating what happened when state was modified.

pub mod progress_events;

pub use progress_events::*;

use serde::{Deserialize, Serialize};

use crate::ids::{BadgeId, StepId, TemplateId, UserId};

/// Lifecycle event for significant onboarding state changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnboardingEvent {
    OnboardingStarted {
        user_id: UserId,
        template_id: TemplateId,
    },
    StepCompleted {
        user_id: UserId,
        step_id: StepId,
        points: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        badge_id: Option<BadgeId>,
    },
    StepSkipped {
        user_id: UserId,
        step_id: StepId,
    },
    QuestCompleted {
        user_id: UserId,
        total_points: u32,
        badge_count: u32,
        duration_ms: u64,
    },
}

impl OnboardingEvent {
    /// Stable event name for log sinks and analytics pipelines.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OnboardingStarted { .. } => "onboarding_started",
            Self::StepCompleted { .. } => "step_completed",
            Self::StepSkipped { .. } => "step_skipped",
            Self::QuestCompleted { .. } => "quest_completed",
        }
    }

    /// The user this event belongs to.
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::OnboardingStarted { user_id, .. }
            | Self::StepCompleted { user_id, .. }
            | Self::StepSkipped { user_id, .. }
            | Self::QuestCompleted { user_id, .. } => user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names_are_stable() {
        let event = OnboardingEvent::StepSkipped {
            user_id: UserId::new("u1").expect("valid id"),
            step_id: StepId::new("s1").expect("valid id"),
        };
        assert_eq!(event.event_type(), "step_skipped");
    }
}
