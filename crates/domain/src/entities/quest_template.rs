//! QuestTemplate entity - ordered quest definitions
//!
//! # Invariants
//!
//! - at least one step, and at least one step is required
//! - step ids are unique within the template
//! - step `order` values form a contiguous, strictly increasing sequence
//!   starting at 1
//!
//! Templates are read-only to the engine; an external authoring tool owns
//! their lifecycle. A template referenced by in-flight progress may only be
//! appended to or deactivated, never reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;
use crate::ids::{BadgeId, StepId, TemplateId};
use crate::value_objects::StepCategory;

/// One unit of onboarding work within a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub id: StepId,
    pub title: String,
    pub description: String,
    /// 1-based position within the template
    pub order: u32,
    pub points: u32,
    pub is_required: bool,
    #[serde(default)]
    pub category: StepCategory,
    /// Badge granted when this step completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_id: Option<BadgeId>,
    /// Numeric completion threshold; plain checklist steps use 1
    #[serde(default = "default_target_value")]
    pub target_value: u32,
}

fn default_target_value() -> u32 {
    1
}

impl StepDefinition {
    pub fn new(
        id: StepId,
        title: impl Into<String>,
        order: u32,
        points: u32,
        is_required: bool,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            order,
            points,
            is_required,
            category: StepCategory::default(),
            badge_id: None,
            target_value: 1,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: StepCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_badge(mut self, badge_id: BadgeId) -> Self {
        self.badge_id = Some(badge_id);
        self
    }

    pub fn with_target_value(mut self, target_value: u32) -> Self {
        self.target_value = target_value.max(1);
        self
    }
}

/// An ordered quest definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestTemplate {
    id: TemplateId,
    name: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    /// Kept sorted by `order` after construction
    steps: Vec<StepDefinition>,
}

impl QuestTemplate {
    /// Build a template, enforcing the step-ordering invariants.
    pub fn new(
        id: TemplateId,
        name: impl Into<String>,
        steps: Vec<StepDefinition>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut steps = steps;
        steps.sort_by_key(|s| s.order);
        validate_steps(&steps)?;

        Ok(Self {
            id,
            name: name.into(),
            description: String::new(),
            is_active: true,
            created_at,
            steps,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Steps in ascending `order`.
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, id: &StepId) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| &s.id == id)
    }

    pub fn contains_step(&self, id: &StepId) -> bool {
        self.step(id).is_some()
    }

    /// The step a fresh progress record starts on.
    pub fn first_step(&self) -> Option<&StepDefinition> {
        self.steps.first()
    }

    /// Sum of points across all steps; the ceiling for `total_points_earned`.
    pub fn total_points(&self) -> u32 {
        self.steps.iter().map(|s| s.points).sum()
    }
}

fn validate_steps(steps: &[StepDefinition]) -> Result<(), DomainError> {
    if steps.is_empty() {
        return Err(DomainError::validation("template must have at least one step"));
    }

    for (index, step) in steps.iter().enumerate() {
        let expected = index as u32 + 1;
        if step.order != expected {
            return Err(DomainError::validation(format!(
                "step order must be contiguous from 1; found {} at position {}",
                step.order, expected
            )));
        }
        if steps[..index].iter().any(|other| other.id == step.id) {
            return Err(DomainError::validation(format!(
                "duplicate step id in template: {}",
                step.id
            )));
        }
    }

    if !steps.iter().any(|s| s.is_required) {
        return Err(DomainError::validation(
            "template must have at least one required step",
        ));
    }

    Ok(())
}

// ============================================================================
// Serde Implementation
// ============================================================================

/// Intermediate format so deserialization re-runs the invariant checks.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestTemplateWireFormat {
    id: TemplateId,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_true")]
    is_active: bool,
    created_at: DateTime<Utc>,
    steps: Vec<StepDefinition>,
}

fn default_true() -> bool {
    true
}

impl Serialize for QuestTemplate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = QuestTemplateWireFormat {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            steps: self.steps.clone(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QuestTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = QuestTemplateWireFormat::deserialize(deserializer)?;
        let template = QuestTemplate::new(wire.id, wire.name, wire.steps, wire.created_at)
            .map_err(serde::de::Error::custom)?
            .with_description(wire.description)
            .with_active(wire.is_active);
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_id(s: &str) -> StepId {
        StepId::new(s).expect("valid step id")
    }

    fn template_id(s: &str) -> TemplateId {
        TemplateId::new(s).expect("valid template id")
    }

    fn three_step_template() -> QuestTemplate {
        QuestTemplate::new(
            template_id("default-onboarding"),
            "Default Onboarding",
            vec![
                StepDefinition::new(step_id("profile"), "Set up profile", 1, 50, true),
                StepDefinition::new(step_id("first-post"), "Publish a post", 2, 75, true),
                StepDefinition::new(step_id("invite"), "Invite a teammate", 3, 100, true),
            ],
            Utc::now(),
        )
        .expect("valid template")
    }

    #[test]
    fn accepts_contiguous_orders() {
        let template = three_step_template();
        assert_eq!(template.step_count(), 3);
        assert_eq!(template.first_step().map(|s| s.id.as_str()), Some("profile"));
        assert_eq!(template.total_points(), 225);
    }

    #[test]
    fn sorts_steps_by_order_on_construction() {
        let template = QuestTemplate::new(
            template_id("t"),
            "T",
            vec![
                StepDefinition::new(step_id("b"), "B", 2, 10, false),
                StepDefinition::new(step_id("a"), "A", 1, 10, true),
            ],
            Utc::now(),
        )
        .expect("valid template");
        assert_eq!(template.steps()[0].id.as_str(), "a");
    }

    #[test]
    fn rejects_gap_in_orders() {
        let result = QuestTemplate::new(
            template_id("t"),
            "T",
            vec![
                StepDefinition::new(step_id("a"), "A", 1, 10, true),
                StepDefinition::new(step_id("b"), "B", 3, 10, false),
            ],
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_duplicate_step_ids() {
        let result = QuestTemplate::new(
            template_id("t"),
            "T",
            vec![
                StepDefinition::new(step_id("a"), "A", 1, 10, true),
                StepDefinition::new(step_id("a"), "Again", 2, 10, false),
            ],
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_all_optional_templates() {
        let result = QuestTemplate::new(
            template_id("t"),
            "T",
            vec![StepDefinition::new(step_id("a"), "A", 1, 10, false)],
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_templates() {
        let result = QuestTemplate::new(template_id("t"), "T", vec![], Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn deserialization_re_validates() {
        let template = three_step_template();
        let json = serde_json::to_string(&template).expect("serialize");
        let back: QuestTemplate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, template);

        // Tampered wire data with a broken order sequence must be rejected
        let tampered = json.replace("\"order\":2", "\"order\":7");
        assert!(serde_json::from_str::<QuestTemplate>(&tampered).is_err());
    }

    #[test]
    fn target_value_floor_is_one() {
        let step = StepDefinition::new(step_id("a"), "A", 1, 10, true).with_target_value(0);
        assert_eq!(step.target_value, 1);
    }
}
