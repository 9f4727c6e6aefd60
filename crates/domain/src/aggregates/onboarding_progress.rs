//! OnboardingProgress aggregate - the per-user quest state machine
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: all state is encapsulated; derived fields are
//!   recomputed on every transition, never patched from outside
//! - **Valid by construction**: `start()` builds a fresh record from a
//!   validated template
//! - **Outcome types**: mutations return `TransitionOutcome` /
//!   `TransitionBlocked` so callers can react without string matching
//!
//! # Invariants
//!
//! - `current_step_id` is always the lowest-order step still `Pending`,
//!   or `None` when no pending steps remain
//! - `total_points_earned` is the sum of points of `Completed` steps
//!   (skipped steps earn 0)
//! - `completion_percentage == round(100 * terminal / total)`
//! - once `is_completed` is true the record is terminal: every further
//!   transition request is refused

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entities::QuestTemplate;
use crate::events::{StepTransition, TransitionBlocked, TransitionOutcome};
use crate::ids::{BadgeId, StepId, TemplateId, UserId};
use crate::value_objects::{StepState, StepStatus};

/// Per-user progress through one quest template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingProgress {
    user_id: UserId,
    template_id: TemplateId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    step_states: BTreeMap<StepId, StepState>,
    current_step_id: Option<StepId>,
    total_points_earned: u32,
    completion_percentage: u8,
    badges_earned: Vec<BadgeId>,
    is_completed: bool,
}

impl OnboardingProgress {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Start fresh progress: every template step `Pending`, zero points.
    pub fn start(user_id: UserId, template: &QuestTemplate, now: DateTime<Utc>) -> Self {
        let step_states = template
            .steps()
            .iter()
            .map(|step| (step.id.clone(), StepState::pending()))
            .collect();

        Self {
            user_id,
            template_id: template.id().clone(),
            started_at: now,
            completed_at: None,
            step_states,
            current_step_id: template.first_step().map(|s| s.id.clone()),
            total_points_earned: 0,
            completion_percentage: 0,
            badges_earned: Vec::new(),
            is_completed: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn step_state(&self, step_id: &StepId) -> Option<&StepState> {
        self.step_states.get(step_id)
    }

    pub fn step_states(&self) -> &BTreeMap<StepId, StepState> {
        &self.step_states
    }

    /// Lowest-order step still pending, or `None` when none remain.
    pub fn current_step_id(&self) -> Option<&StepId> {
        self.current_step_id.as_ref()
    }

    pub fn total_points_earned(&self) -> u32 {
        self.total_points_earned
    }

    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    /// Badge ids in unlock order.
    pub fn badges_earned(&self) -> &[BadgeId] {
        &self.badges_earned
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Time from start to now, for the terminal analytics event.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_milliseconds().max(0) as u64
    }

    /// Definition of the lowest-order step still pending.
    pub fn next_step<'a>(&self, template: &'a QuestTemplate) -> Option<&'a crate::entities::StepDefinition> {
        template.steps().iter().find(|step| {
            self.step_states
                .get(&step.id)
                .map_or(true, |state| state.status == StepStatus::Pending)
        })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Mark a step completed, awarding its points.
    ///
    /// Idempotent: completing an already-completed step is a no-op.
    /// Completion of any pending step is accepted regardless of order;
    /// `current_step_id` keeps tracking the earliest remaining one.
    pub fn complete_step(
        &mut self,
        template: &QuestTemplate,
        step_id: &StepId,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TransitionBlocked> {
        if self.is_completed {
            return Err(TransitionBlocked::ProgressTerminal);
        }
        let step = template
            .step(step_id)
            .ok_or_else(|| TransitionBlocked::StepNotInTemplate {
                step_id: step_id.clone(),
            })?;

        let state = self
            .step_states
            .entry(step_id.clone())
            .or_insert_with(StepState::pending);
        if state.status == StepStatus::Completed {
            return Ok(TransitionOutcome::AlreadyDone);
        }

        state.status = StepStatus::Completed;
        state.current_value = step.target_value;
        state.completed_at = Some(now);

        self.recompute(template);
        if self.is_completed {
            self.completed_at = Some(now);
        }

        Ok(TransitionOutcome::Applied(StepTransition {
            step_id: step_id.clone(),
            status: StepStatus::Completed,
            points_awarded: step.points,
            badge_id: step.badge_id.clone(),
            quest_completed: self.is_completed,
        }))
    }

    /// Mark an optional step skipped. Skips earn no points and no badge.
    pub fn skip_step(
        &mut self,
        template: &QuestTemplate,
        step_id: &StepId,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TransitionBlocked> {
        if self.is_completed {
            return Err(TransitionBlocked::ProgressTerminal);
        }
        let step = template
            .step(step_id)
            .ok_or_else(|| TransitionBlocked::StepNotInTemplate {
                step_id: step_id.clone(),
            })?;
        if step.is_required {
            return Err(TransitionBlocked::RequiredStepSkip {
                step_id: step_id.clone(),
            });
        }

        let state = self
            .step_states
            .entry(step_id.clone())
            .or_insert_with(StepState::pending);
        if state.status.is_terminal() {
            return Ok(TransitionOutcome::AlreadyDone);
        }

        state.status = StepStatus::Skipped;

        self.recompute(template);
        if self.is_completed {
            self.completed_at = Some(now);
        }

        Ok(TransitionOutcome::Applied(StepTransition {
            step_id: step_id.clone(),
            status: StepStatus::Skipped,
            points_awarded: 0,
            badge_id: None,
            quest_completed: self.is_completed,
        }))
    }

    /// Record a badge unlocked through this progress. Returns false if the
    /// badge was already recorded.
    pub fn record_badge(&mut self, badge_id: BadgeId) -> bool {
        if self.badges_earned.contains(&badge_id) {
            return false;
        }
        self.badges_earned.push(badge_id);
        true
    }

    /// Recompute every derived field from `step_states` and the template.
    ///
    /// The template is the source of truth for step order, points, and the
    /// step population (steps appended to the template after initialization
    /// count as pending here).
    fn recompute(&mut self, template: &QuestTemplate) {
        let total = template.step_count();
        let mut terminal = 0usize;
        let mut points = 0u32;
        let mut current: Option<StepId> = None;

        for step in template.steps() {
            let status = self
                .step_states
                .get(&step.id)
                .map_or(StepStatus::Pending, |s| s.status);
            match status {
                StepStatus::Pending => {
                    if current.is_none() {
                        current = Some(step.id.clone());
                    }
                }
                StepStatus::Completed => {
                    terminal += 1;
                    points += step.points;
                }
                StepStatus::Skipped => {
                    terminal += 1;
                }
            }
        }

        self.total_points_earned = points;
        self.current_step_id = current;
        self.completion_percentage = percentage(terminal, total);
        self.is_completed = terminal == total && total > 0;
    }
}

fn percentage(terminal: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((terminal as f64 / total as f64) * 100.0).round() as u8
}

// ============================================================================
// Serde Implementation
// ============================================================================

/// Intermediate format matching the persisted document shape.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressWireFormat {
    user_id: UserId,
    template_id: TemplateId,
    started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    step_states: BTreeMap<StepId, StepState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_step_id: Option<StepId>,
    total_points_earned: u32,
    completion_percentage: u8,
    #[serde(default)]
    badges_earned: Vec<BadgeId>,
    is_completed: bool,
}

impl Serialize for OnboardingProgress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = ProgressWireFormat {
            user_id: self.user_id.clone(),
            template_id: self.template_id.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            step_states: self.step_states.clone(),
            current_step_id: self.current_step_id.clone(),
            total_points_earned: self.total_points_earned,
            completion_percentage: self.completion_percentage,
            badges_earned: self.badges_earned.clone(),
            is_completed: self.is_completed,
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OnboardingProgress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ProgressWireFormat::deserialize(deserializer)?;
        Ok(OnboardingProgress {
            user_id: wire.user_id,
            template_id: wire.template_id,
            started_at: wire.started_at,
            completed_at: wire.completed_at,
            step_states: wire.step_states,
            current_step_id: wire.current_step_id,
            total_points_earned: wire.total_points_earned,
            completion_percentage: wire.completion_percentage,
            badges_earned: wire.badges_earned,
            is_completed: wire.is_completed,
        })
    }
}
