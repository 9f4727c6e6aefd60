//! Step status and category value objects.
//!
//! - StepStatus: per-step lifecycle within a progress record
//! - StepState: the mutable slice of progress owned by a single step
//! - StepCategory: coarse grouping used by presentation layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a single step within a user's progress.
///
/// `Completed` and `Skipped` are terminal; a terminal step never
/// transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet acted on
    #[default]
    Pending,
    /// Finished; points were awarded
    Completed,
    /// Passed over; no points, no badge
    Skipped,
}

impl StepStatus {
    /// Terminal statuses count toward the completion percentage.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-step mutable state inside an `OnboardingProgress` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepState {
    pub status: StepStatus,
    /// Counter toward the step's target value (steps default to a target of 1)
    pub current_value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepState {
    /// Fresh state for a newly initialized step.
    pub fn pending() -> Self {
        Self {
            status: StepStatus::Pending,
            current_value: 0,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Default for StepState {
    fn default() -> Self {
        Self::pending()
    }
}

/// Coarse grouping of onboarding steps.
///
/// The engine never interprets categories; they ride along for
/// presentation layers and analytics segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    #[default]
    Setup,
    Exploration,
    Networking,
    Content,
    Mastery,
}

impl StepCategory {
    /// All categories, for UI filters
    pub fn all() -> &'static [StepCategory] {
        &[
            StepCategory::Setup,
            StepCategory::Exploration,
            StepCategory::Networking,
            StepCategory::Content,
            StepCategory::Mastery,
        ]
    }
}

impl fmt::Display for StepCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Exploration => write!(f, "exploration"),
            Self::Networking => write!(f, "networking"),
            Self::Content => write!(f, "content"),
            Self::Mastery => write!(f, "mastery"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_not_terminal() {
        assert!(!StepStatus::Pending.is_terminal());
        assert!(StepStatus::Completed.is_terminal());
        assert!(StepStatus::Skipped.is_terminal());
    }

    #[test]
    fn fresh_state_starts_at_zero() {
        let state = StepState::pending();
        assert_eq!(state.status, StepStatus::Pending);
        assert_eq!(state.current_value, 0);
        assert!(state.completed_at.is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&StepStatus::Completed).expect("serialize");
        assert_eq!(json, "\"completed\"");
    }
}
