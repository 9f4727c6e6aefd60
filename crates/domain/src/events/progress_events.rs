//! Progress-related transition outcomes
//!
//! These types communicate what happened when a progress record was
//! mutated, allowing callers to react appropriately.

use crate::ids::{BadgeId, StepId};
use crate::value_objects::StepStatus;

/// A step transition that was applied to a progress record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTransition {
    pub step_id: StepId,
    /// The step's new terminal status
    pub status: StepStatus,
    /// Points added to the running total (0 for skips)
    pub points_awarded: u32,
    /// Badge attached to the step, if any (never set for skips)
    pub badge_id: Option<BadgeId>,
    /// True when this transition made the whole quest terminal
    pub quest_completed: bool,
}

/// Outcome of requesting a step transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The step moved to a new terminal status
    Applied(StepTransition),
    /// The step was already in a terminal state; nothing changed
    AlreadyDone,
}

impl TransitionOutcome {
    pub fn applied(&self) -> Option<&StepTransition> {
        match self {
            Self::Applied(transition) => Some(transition),
            Self::AlreadyDone => None,
        }
    }
}

/// Why a requested transition was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionBlocked {
    /// The whole progress record is terminal; no transitions remain
    ProgressTerminal,
    /// The step id does not belong to the resolved template
    StepNotInTemplate { step_id: StepId },
    /// Required steps cannot be skipped
    RequiredStepSkip { step_id: StepId },
}
